//! Capability interfaces for the station hardware and the sampling
//! strategies built on them.
//!
//! Bus bindings live outside this crate; anything implementing these traits
//! can be plugged into a [`Sampler`](crate::sampling::Sampler).

mod analog;
mod environment;
mod pulse;
pub mod simulated;
mod wind_vane;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::SamplingResult;

pub use analog::AnalogReader;
pub use environment::EnvironmentReader;
pub use pulse::{PulseCounter, PulseTally};
pub use wind_vane::{CompassThresholds, WindVane, RESISTANCE_BY_ANGLE};

/// Called once per detected edge.
pub type PulseHandler = Arc<dyn Fn() + Send + Sync>;

/// Discrete edge events (reed switches on the anemometer and rain bucket).
pub trait PulseSource: Send {
    fn subscribe(&mut self, handler: PulseHandler);
    fn unsubscribe(&mut self);
}

/// Ratiometric ADC channel, values in `[0, 1]`.
pub trait AnalogSource: Send {
    fn read(&mut self) -> SamplingResult<f64>;
}

/// Opaque per-device calibration data, read once from the sensor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calibration(pub Vec<u8>);

/// Combined temperature/humidity/pressure sensor. The driver owns its bus.
pub trait EnvironmentalDriver: Send {
    fn load_calibration(&mut self) -> SamplingResult<Calibration>;
    fn sample(&mut self, calibration: &Calibration) -> SamplingResult<EnvironmentSample>;
}

/// One environmental transaction; `timestamp` comes from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSample {
    /// °C
    pub temperature: f64,
    /// % relative humidity
    pub humidity: f64,
    /// hPa
    pub pressure: f64,
    pub timestamp: DateTime<Utc>,
}
