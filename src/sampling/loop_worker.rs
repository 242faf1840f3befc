use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::{sync::mpsc::{self, error::TrySendError}, time::Instant};

use crate::errors::{ErrorSink, SamplingError, SamplingResult};

use super::{
    strategy::AcquisitionStrategy,
    window::{SlidingWindow, WindowSnapshot},
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

/// State shared between a sampler handle and its in-flight ticks.
pub(crate) struct SamplerShared<S: AcquisitionStrategy> {
    pub(crate) name: &'static str,
    pub(crate) interval: Duration,
    pub(crate) strategy: Mutex<S>,
    pub(crate) window: Mutex<SlidingWindow<S::Sample>>,
    pub(crate) snapshots: Option<mpsc::Sender<WindowSnapshot<S::Sample>>>,
    pub(crate) errors: Arc<dyn ErrorSink>,
}

impl<S: AcquisitionStrategy> SamplerShared<S> {
    pub(crate) fn with_strategy<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.strategy.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    fn acquire(&self) -> SamplingResult<S::Sample> {
        self.with_strategy(|strategy| strategy.acquire())
    }

    pub(crate) fn window_contents(&self) -> Vec<S::Sample> {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_vec()
    }

    /// Append and hand a copy to the subscriber while the window is still
    /// locked, so snapshots leave in acquisition order.
    fn store(&self, sample: S::Sample) -> usize {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.push(sample);

        if let Some(tx) = &self.snapshots {
            match tx.try_send(window.snapshot(self.interval)) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    log_warn!("sampler {}: reducer is behind, dropping snapshot", self.name);
                }
                Err(TrySendError::Closed(_)) => {
                    log_debug!("sampler {}: snapshot receiver gone", self.name);
                }
            }
        }

        window.len()
    }
}

/// One sampling tick: acquire on the blocking pool, store, publish snapshot.
/// Failures are reported and leave the window untouched.
pub(crate) async fn tick<S: AcquisitionStrategy>(shared: Arc<SamplerShared<S>>) {
    let tick_start = Instant::now();

    let worker = Arc::clone(&shared);
    let acquired = tokio::task::spawn_blocking(move || worker.acquire()).await;

    let sample = match acquired {
        Ok(Ok(sample)) => sample,
        Ok(Err(err)) => {
            shared.errors.report(shared.name, &err);
            return;
        }
        Err(join_err) => {
            let err = SamplingError::acquisition(
                shared.name,
                format!("acquisition worker failed: {join_err}"),
            );
            shared.errors.report(shared.name, &err);
            return;
        }
    };

    let len = shared.store(sample);
    log_debug!(
        "sampler {} tick: window {} sample(s), {}ms",
        shared.name,
        len,
        tick_start.elapsed().as_millis()
    );
}
