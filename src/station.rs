use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::aggregator::{Aggregator, StationSources};
use crate::clock::Clock;
use crate::reconciler::{spawn_reconciler, DownstreamListener, Reconciler};
use crate::settings::StationSettings;

/// A running aggregator wired to a reconciler and its listener.
pub struct Station {
    aggregator: Aggregator,
    reconciler: JoinHandle<Reconciler>,
}

impl Station {
    pub fn start(
        settings: &StationSettings,
        sources: StationSources,
        clock: Arc<dyn Clock>,
        listener: Arc<dyn DownstreamListener>,
    ) -> Result<Self> {
        let (batch_tx, batch_rx) = mpsc::unbounded_channel();
        let aggregator = Aggregator::start(settings, sources, Arc::clone(&clock), batch_tx)?;
        let reconciler = spawn_reconciler(batch_rx, Reconciler::new(clock), listener);

        Ok(Self {
            aggregator,
            reconciler,
        })
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Stop sampling, let the reconciler drain, and hand it back.
    pub async fn shutdown(mut self) -> Result<Reconciler> {
        self.aggregator.shutdown().await?;
        drop(self.aggregator);
        self.reconciler
            .await
            .context("reconciler task failed to join")
    }
}
