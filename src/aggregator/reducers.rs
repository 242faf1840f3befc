use std::time::Duration;

use crate::metrics::{
    anemometer_scale, circular_mean, dew_point, gust, hourly_trend, mean_speed,
    samples_per_period, trailing_total,
};
use crate::readings::{ReadingKey, ReadingUpdate};
use crate::sampling::WindowSnapshot;
use crate::sensors::EnvironmentSample;

const HOUR: Duration = Duration::from_secs(3600);

/// Turns one window snapshot into the readings it determines.
pub(crate) trait Reducer: Send + 'static {
    type Sample: Clone + Send + Sync + 'static;

    fn name(&self) -> &'static str;
    fn reduce(&self, snapshot: &WindowSnapshot<Self::Sample>) -> Vec<ReadingUpdate>;
}

/// Air readings, stamped with the sensor's own timestamp.
pub(crate) struct EnvironmentReducer;

impl Reducer for EnvironmentReducer {
    type Sample = EnvironmentSample;

    fn name(&self) -> &'static str {
        "environment"
    }

    fn reduce(&self, snapshot: &WindowSnapshot<EnvironmentSample>) -> Vec<ReadingUpdate> {
        let Some(latest) = snapshot.latest() else {
            return Vec::new();
        };
        let at = Some(latest.timestamp);
        let interval = snapshot.interval_secs();

        let pressures: Vec<f64> = snapshot.samples.iter().map(|s| s.pressure).collect();
        let temperatures: Vec<f64> = snapshot.samples.iter().map(|s| s.temperature).collect();

        [
            ReadingUpdate::new(ReadingKey::Humidity, latest.humidity, at),
            ReadingUpdate::new(ReadingKey::Pressure, latest.pressure, at),
            ReadingUpdate::new(ReadingKey::PressureTrend, hourly_trend(&pressures, interval), at),
            ReadingUpdate::new(ReadingKey::Temperature, latest.temperature, at),
            ReadingUpdate::new(
                ReadingKey::TemperatureTrend,
                hourly_trend(&temperatures, interval),
                at,
            ),
            ReadingUpdate::new(
                ReadingKey::DewPoint,
                dew_point(latest.temperature, latest.humidity),
                at,
            ),
        ]
        .into_iter()
        // dew point of bone-dry air is undefined; the stored reading stays
        .filter(|update| update.value.is_finite())
        .collect()
    }
}

pub(crate) struct WindDirectionReducer;

impl Reducer for WindDirectionReducer {
    type Sample = f64;

    fn name(&self) -> &'static str {
        "wind_direction"
    }

    fn reduce(&self, snapshot: &WindowSnapshot<f64>) -> Vec<ReadingUpdate> {
        circular_mean(&snapshot.samples)
            .map(|heading| vec![ReadingUpdate::new(ReadingKey::WindDeg, heading, None)])
            .unwrap_or_default()
    }
}

pub(crate) struct WindSpeedReducer {
    pub(crate) kmh_per_hz: f64,
}

impl Reducer for WindSpeedReducer {
    type Sample = u64;

    fn name(&self) -> &'static str {
        "wind_speed"
    }

    fn reduce(&self, snapshot: &WindowSnapshot<u64>) -> Vec<ReadingUpdate> {
        if snapshot.is_empty() {
            return Vec::new();
        }
        let scale = anemometer_scale(self.kmh_per_hz, snapshot.interval_secs());
        vec![
            ReadingUpdate::new(ReadingKey::WindGust, gust(&snapshot.samples, scale), None),
            ReadingUpdate::new(ReadingKey::WindSpeed, mean_speed(&snapshot.samples, scale), None),
        ]
    }
}

pub(crate) struct RainReducer {
    pub(crate) mm_per_tip: f64,
}

impl Reducer for RainReducer {
    type Sample = u64;

    fn name(&self) -> &'static str {
        "rain"
    }

    fn reduce(&self, snapshot: &WindowSnapshot<u64>) -> Vec<ReadingUpdate> {
        if snapshot.is_empty() {
            return Vec::new();
        }
        let counts = &snapshot.samples;
        let hourly = samples_per_period(HOUR, snapshot.interval);
        let six_hourly = samples_per_period(HOUR * 6, snapshot.interval);

        vec![
            ReadingUpdate::new(
                ReadingKey::Rain1h,
                trailing_total(counts, hourly, self.mm_per_tip),
                None,
            ),
            ReadingUpdate::new(
                ReadingKey::Rain6h,
                trailing_total(counts, six_hourly, self.mm_per_tip),
                None,
            ),
            ReadingUpdate::new(
                ReadingKey::Rain24h,
                trailing_total(counts, counts.len(), self.mm_per_tip),
                None,
            ),
        ]
    }
}
