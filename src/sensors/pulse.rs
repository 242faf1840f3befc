use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use crate::errors::SamplingResult;
use crate::sampling::AcquisitionStrategy;

use super::{PulseHandler, PulseSource};

/// Edge count shared between the event path and the sampler.
///
/// `take` is a single atomic swap, so every edge lands in exactly one
/// sampling window.
#[derive(Debug, Clone, Default)]
pub struct PulseTally {
    count: Arc<AtomicU64>,
}

impl PulseTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    /// Read-and-reset.
    pub fn take(&self) -> u64 {
        self.count.swap(0, Ordering::AcqRel)
    }

    pub fn peek(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}

/// Counts edges between acquisitions.
pub struct PulseCounter {
    name: &'static str,
    source: Box<dyn PulseSource>,
    tally: PulseTally,
}

impl PulseCounter {
    pub fn new(name: &'static str, source: Box<dyn PulseSource>) -> Self {
        Self {
            name,
            source,
            tally: PulseTally::new(),
        }
    }

    pub fn tally(&self) -> PulseTally {
        self.tally.clone()
    }
}

impl AcquisitionStrategy for PulseCounter {
    type Sample = u64;

    fn name(&self) -> &'static str {
        self.name
    }

    fn acquire(&mut self) -> SamplingResult<u64> {
        Ok(self.tally.take())
    }

    fn attach(&mut self) -> SamplingResult<()> {
        self.tally.take();
        let tally = self.tally.clone();
        let handler: PulseHandler = Arc::new(move || tally.record());
        self.source.subscribe(handler);
        Ok(())
    }

    fn detach(&mut self) {
        self.source.unsubscribe();
    }
}
