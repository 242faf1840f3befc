//! Final ordering stage between the aggregator and whatever publishes.

mod state;
mod worker;

pub use state::{OutboundEvent, Reconciler};
pub use worker::{spawn_reconciler, DownstreamListener};
