//! Samplers, reducers and the shared reading store for one station.

mod controller;
mod reducers;
mod worker;

pub use controller::{Aggregator, StationSources};
