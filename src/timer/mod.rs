pub mod controller;

pub use controller::{cancel, schedule, IntervalTimer, TimerHandle, DEFAULT_MAX_IN_FLIGHT};
