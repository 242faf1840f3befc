pub mod controller;
mod loop_worker;
pub mod state;
pub mod strategy;
pub mod window;

pub use controller::{ManagedSampler, Sampler};
pub use state::SamplerStatus;
pub use strategy::AcquisitionStrategy;
pub use window::{SamplerConfig, SlidingWindow, WindowSnapshot};
