use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed set of published metrics, in schema order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReadingKey {
    #[serde(rename = "humidity")]
    Humidity,
    #[serde(rename = "pressure")]
    Pressure,
    #[serde(rename = "pressure-trend")]
    PressureTrend,
    #[serde(rename = "temperature")]
    Temperature,
    #[serde(rename = "temperature-trend")]
    TemperatureTrend,
    #[serde(rename = "dew_point")]
    DewPoint,
    #[serde(rename = "wind_deg")]
    WindDeg,
    #[serde(rename = "wind_gust")]
    WindGust,
    #[serde(rename = "wind_speed")]
    WindSpeed,
    #[serde(rename = "rain_1h")]
    Rain1h,
    #[serde(rename = "rain_6h")]
    Rain6h,
    #[serde(rename = "rain_24h")]
    Rain24h,
}

impl ReadingKey {
    pub const ALL: [ReadingKey; 12] = [
        ReadingKey::Humidity,
        ReadingKey::Pressure,
        ReadingKey::PressureTrend,
        ReadingKey::Temperature,
        ReadingKey::TemperatureTrend,
        ReadingKey::DewPoint,
        ReadingKey::WindDeg,
        ReadingKey::WindGust,
        ReadingKey::WindSpeed,
        ReadingKey::Rain1h,
        ReadingKey::Rain6h,
        ReadingKey::Rain24h,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingKey::Humidity => "humidity",
            ReadingKey::Pressure => "pressure",
            ReadingKey::PressureTrend => "pressure-trend",
            ReadingKey::Temperature => "temperature",
            ReadingKey::TemperatureTrend => "temperature-trend",
            ReadingKey::DewPoint => "dew_point",
            ReadingKey::WindDeg => "wind_deg",
            ReadingKey::WindGust => "wind_gust",
            ReadingKey::WindSpeed => "wind_speed",
            ReadingKey::Rain1h => "rain_1h",
            ReadingKey::Rain6h => "rain_6h",
            ReadingKey::Rain24h => "rain_24h",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ReadingKey::Humidity => "%",
            ReadingKey::Pressure => "hPa",
            ReadingKey::PressureTrend => "hPa/hr",
            ReadingKey::Temperature | ReadingKey::DewPoint => "°C",
            ReadingKey::TemperatureTrend => "°C/hr",
            ReadingKey::WindDeg => "degrees",
            ReadingKey::WindGust | ReadingKey::WindSpeed => "m/s",
            ReadingKey::Rain1h | ReadingKey::Rain6h | ReadingKey::Rain24h => "mm",
        }
    }

    pub fn precision(&self) -> Precision {
        match self {
            ReadingKey::Humidity | ReadingKey::Pressure | ReadingKey::WindDeg => Precision::Whole,
            ReadingKey::Temperature | ReadingKey::DewPoint => Precision::Half,
            ReadingKey::PressureTrend
            | ReadingKey::TemperatureTrend
            | ReadingKey::WindGust
            | ReadingKey::WindSpeed => Precision::Tenth,
            ReadingKey::Rain1h | ReadingKey::Rain6h | ReadingKey::Rain24h => {
                Precision::TenThousandth
            }
        }
    }

    /// Round to the published precision. Headings stay in `[0, 360)`.
    pub fn quantize(&self, value: f64) -> f64 {
        let rounded = self.precision().apply(value);
        match self {
            ReadingKey::WindDeg => rounded.rem_euclid(360.0),
            _ => rounded,
        }
    }
}

impl fmt::Display for ReadingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0} is not a known reading")]
pub struct UnknownReadingKey(pub String);

impl FromStr for ReadingKey {
    type Err = UnknownReadingKey;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ReadingKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str() == name)
            .ok_or_else(|| UnknownReadingKey(name.to_string()))
    }
}

/// Published resolution of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Whole,
    Half,
    Tenth,
    TenThousandth,
}

impl Precision {
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Precision::Whole => value.round(),
            Precision::Half => (value * 2.0).round() / 2.0,
            Precision::Tenth => (value * 10.0).round() / 10.0,
            Precision::TenThousandth => (value * 10_000.0).round() / 10_000.0,
        }
    }
}

/// Where a reading's timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimestampOrigin {
    /// Supplied with the measurement.
    Sensor,
    /// Filled in from the store clock at update time.
    WallClock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub value: Option<f64>,
    unit: &'static str,
    pub timestamp: DateTime<Utc>,
    pub origin: TimestampOrigin,
}

impl SensorReading {
    /// Empty reading, stamped `now` until a value arrives.
    pub fn new(unit: &'static str, now: DateTime<Utc>) -> Self {
        Self {
            value: None,
            unit,
            timestamp: now,
            origin: TimestampOrigin::WallClock,
        }
    }

    pub fn with_value(
        value: Option<f64>,
        unit: &'static str,
        timestamp: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut reading = Self::new(unit, now);
        reading.update(value, timestamp, now);
        reading
    }

    /// Replace value and timestamp; without a sensor timestamp the reading
    /// is stamped `now`.
    pub fn update(
        &mut self,
        value: Option<f64>,
        timestamp: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        self.value = value;
        match timestamp {
            Some(at) => {
                self.timestamp = at;
                self.origin = TimestampOrigin::Sensor;
            }
            None => {
                self.timestamp = now;
                self.origin = TimestampOrigin::WallClock;
            }
        }
    }

    pub fn unit(&self) -> &'static str {
        self.unit
    }

    pub fn has_sensor_timestamp(&self) -> bool {
        self.origin == TimestampOrigin::Sensor
    }
}
