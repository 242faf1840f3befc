//! Stand-in hardware: random-walk sources for running the station without a
//! bus, and scripted sources for tests.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, PoisonError,
    },
    thread,
    time::Duration,
};

use chrono::Utc;
use rand::Rng;

use crate::errors::{SamplingError, SamplingResult};

use super::{
    AnalogSource, Calibration, EnvironmentSample, EnvironmentalDriver, PulseHandler, PulseSource,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error};

// ---------------------------------------------------------------------------
// Scripted sources
// ---------------------------------------------------------------------------

type SharedHandler = Arc<Mutex<Option<PulseHandler>>>;

/// Pulse source whose edges are fired by hand through a [`PulseTrigger`].
#[derive(Default)]
pub struct ManualPulseSource {
    handler: SharedHandler,
}

impl ManualPulseSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) -> PulseTrigger {
        PulseTrigger {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl PulseSource for ManualPulseSource {
    fn subscribe(&mut self, handler: PulseHandler) {
        *self.handler.lock().unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    fn unsubscribe(&mut self) {
        self.handler.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

#[derive(Clone)]
pub struct PulseTrigger {
    handler: SharedHandler,
}

impl PulseTrigger {
    /// Fire `count` edges; dropped silently when nobody is subscribed.
    pub fn pulse(&self, count: u64) {
        let handler = self
            .handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(handler) = handler {
            for _ in 0..count {
                handler();
            }
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.handler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// Always reads the same ratio.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnalogSource {
    value: f64,
}

impl FixedAnalogSource {
    pub fn new(value: f64) -> Self {
        Self { value }
    }
}

impl AnalogSource for FixedAnalogSource {
    fn read(&mut self) -> SamplingResult<f64> {
        Ok(self.value)
    }
}

/// Replays a fixed list of results, then fails.
pub struct ScriptedEnvironment {
    script: VecDeque<SamplingResult<EnvironmentSample>>,
    fail_calibration: bool,
}

impl ScriptedEnvironment {
    pub fn new(script: Vec<SamplingResult<EnvironmentSample>>) -> Self {
        Self {
            script: script.into(),
            fail_calibration: false,
        }
    }

    pub fn with_failing_calibration(mut self) -> Self {
        self.fail_calibration = true;
        self
    }
}

impl EnvironmentalDriver for ScriptedEnvironment {
    fn load_calibration(&mut self) -> SamplingResult<Calibration> {
        if self.fail_calibration {
            return Err(SamplingError::acquisition("environment", "calibration read failed"));
        }
        Ok(Calibration(vec![0x88; 26]))
    }

    fn sample(&mut self, _calibration: &Calibration) -> SamplingResult<EnvironmentSample> {
        self.script
            .pop_front()
            .unwrap_or_else(|| Err(SamplingError::acquisition("environment", "script exhausted")))
    }
}

// ---------------------------------------------------------------------------
// Random-walk sources
// ---------------------------------------------------------------------------

/// Emits edges from a background thread at roughly `rate_hz`.
pub struct SimulatedPulseSource {
    name: &'static str,
    rate_hz: f64,
    running: Option<Arc<AtomicBool>>,
}

impl SimulatedPulseSource {
    pub fn new(name: &'static str, rate_hz: f64) -> Self {
        Self {
            name,
            rate_hz,
            running: None,
        }
    }
}

impl PulseSource for SimulatedPulseSource {
    fn subscribe(&mut self, handler: PulseHandler) {
        self.unsubscribe();
        if self.rate_hz <= 0.0 {
            return;
        }

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let rate_hz = self.rate_hz;
        let spawned = thread::Builder::new()
            .name(format!("sim-{}", self.name))
            .spawn(move || {
                let mut rng = rand::thread_rng();
                while flag.load(Ordering::Acquire) {
                    // exponential gaps give a Poisson edge stream
                    let u: f64 = rng.gen_range(f64::EPSILON..1.0);
                    let gap = (-u.ln() / rate_hz).min(5.0);
                    thread::sleep(Duration::from_secs_f64(gap));
                    if flag.load(Ordering::Acquire) {
                        handler();
                    }
                }
            });

        match spawned {
            Ok(_) => {
                log_debug!("simulated pulse source {} at {} Hz", self.name, rate_hz);
                self.running = Some(running);
            }
            Err(err) => log_error!("failed to spawn simulated pulse source {}: {err}", self.name),
        }
    }

    fn unsubscribe(&mut self) {
        if let Some(running) = self.running.take() {
            running.store(false, Ordering::Release);
        }
    }
}

impl Drop for SimulatedPulseSource {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

/// Vane ratio that wanders between neighbouring headings.
pub struct DriftingAnalogSource {
    value: f64,
    step: f64,
}

impl DriftingAnalogSource {
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            value: start.clamp(0.0, 1.0),
            step,
        }
    }
}

impl AnalogSource for DriftingAnalogSource {
    fn read(&mut self) -> SamplingResult<f64> {
        let delta = rand::thread_rng().gen_range(-self.step..=self.step);
        self.value = (self.value + delta).clamp(0.0, 1.0);
        Ok(self.value)
    }
}

/// BME280-like driver producing plausible slowly varying weather.
pub struct SimulatedEnvironment {
    temperature: f64,
    humidity: f64,
    pressure: f64,
}

impl Default for SimulatedEnvironment {
    fn default() -> Self {
        Self {
            temperature: 18.0,
            humidity: 60.0,
            pressure: 1013.0,
        }
    }
}

impl EnvironmentalDriver for SimulatedEnvironment {
    fn load_calibration(&mut self) -> SamplingResult<Calibration> {
        Ok(Calibration(vec![0; 26]))
    }

    fn sample(&mut self, _calibration: &Calibration) -> SamplingResult<EnvironmentSample> {
        let mut rng = rand::thread_rng();
        self.temperature = (self.temperature + rng.gen_range(-0.2..=0.2)).clamp(-40.0, 50.0);
        self.humidity = (self.humidity + rng.gen_range(-1.0..=1.0)).clamp(5.0, 100.0);
        self.pressure = (self.pressure + rng.gen_range(-0.3..=0.3)).clamp(950.0, 1060.0);

        Ok(EnvironmentSample {
            temperature: self.temperature,
            humidity: self.humidity,
            pressure: self.pressure,
            timestamp: Utc::now(),
        })
    }
}
