use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use log::info;
use tokio::{runtime::Handle, sync::mpsc};

use crate::errors::{ErrorSink, LogErrorSink};
use crate::timer::{IntervalTimer, TimerHandle};

use super::{
    loop_worker::{tick, SamplerShared},
    state::SamplerStatus,
    strategy::AcquisitionStrategy,
    window::{SamplerConfig, SlidingWindow, WindowSnapshot},
};

/// Type-erased lifecycle so heterogeneous samplers can live in one list.
pub trait ManagedSampler: Send {
    fn name(&self) -> &'static str;
    fn status(&self) -> SamplerStatus;
    fn start(&mut self) -> Result<()>;
    fn cancel(&mut self);
}

/// Sliding-window sampling engine driving one acquisition strategy.
pub struct Sampler<S: AcquisitionStrategy> {
    config: SamplerConfig,
    status: SamplerStatus,
    shared: Arc<SamplerShared<S>>,
    timer: Option<TimerHandle>,
}

impl<S: AcquisitionStrategy> Sampler<S> {
    pub fn new(strategy: S, config: SamplerConfig) -> Self {
        let shared = SamplerShared {
            name: strategy.name(),
            interval: config.interval(),
            strategy: Mutex::new(strategy),
            window: Mutex::new(SlidingWindow::new(config.capacity())),
            snapshots: None,
            errors: Arc::new(LogErrorSink),
        };

        Self {
            config,
            status: SamplerStatus::Idle,
            shared: Arc::new(shared),
            timer: None,
        }
    }

    /// Deliver a window copy to `tx` after every stored sample.
    pub fn with_snapshots(mut self, tx: mpsc::Sender<WindowSnapshot<S::Sample>>) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.snapshots = Some(tx);
        }
        self
    }

    pub fn with_error_sink(mut self, sink: Arc<dyn ErrorSink>) -> Self {
        if let Some(shared) = Arc::get_mut(&mut self.shared) {
            shared.errors = sink;
        }
        self
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Copy of the current window, oldest first.
    pub fn window(&self) -> Vec<S::Sample> {
        self.shared.window_contents()
    }

    fn start_sampling(&mut self) -> Result<()> {
        match self.status {
            SamplerStatus::Idle => {}
            SamplerStatus::Running => bail!("sampler {} already running", self.shared.name),
            SamplerStatus::Cancelled => {
                bail!("sampler {} was cancelled and cannot be restarted", self.shared.name)
            }
        }

        let runtime = Handle::try_current().with_context(|| {
            format!("sampler {} must be started inside a Tokio runtime", self.shared.name)
        })?;

        self.shared
            .with_strategy(|strategy| strategy.attach())
            .with_context(|| format!("failed to attach sampler {}", self.shared.name))?;

        let shared = Arc::clone(&self.shared);
        let timer = match IntervalTimer::new(self.shared.name, self.config.interval())
            .with_max_in_flight(1)
            .schedule_on(&runtime, move || tick(Arc::clone(&shared)))
        {
            Ok(timer) => timer,
            Err(err) => {
                self.shared.with_strategy(|strategy| strategy.detach());
                return Err(err);
            }
        };

        // First reading without waiting a full interval.
        runtime.spawn(tick(Arc::clone(&self.shared)));

        self.timer = Some(timer);
        self.status = SamplerStatus::Running;

        info!(
            "sampler {} started: every {}s, window of {}",
            self.shared.name,
            self.config.interval().as_secs_f64(),
            self.config.capacity()
        );
        Ok(())
    }

    fn cancel_sampling(&mut self) {
        if self.status == SamplerStatus::Running {
            self.shared.with_strategy(|strategy| strategy.detach());
            info!("sampler {} cancelled", self.shared.name);
        }
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
        self.status = SamplerStatus::Cancelled;
    }
}

impl<S: AcquisitionStrategy> ManagedSampler for Sampler<S> {
    fn name(&self) -> &'static str {
        self.shared.name
    }

    fn status(&self) -> SamplerStatus {
        self.status
    }

    fn start(&mut self) -> Result<()> {
        self.start_sampling()
    }

    fn cancel(&mut self) {
        self.cancel_sampling()
    }
}

impl<S: AcquisitionStrategy> Drop for Sampler<S> {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }
}
