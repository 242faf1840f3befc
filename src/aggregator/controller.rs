use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio::{runtime::Handle, sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::readings::{ReadingBatch, ReadingKey, ReadingStore, SensorReading, UnknownReadingKey};
use crate::sampling::{
    AcquisitionStrategy, ManagedSampler, Sampler, SamplerConfig, SamplerStatus,
};
use crate::sensors::{
    AnalogSource, CompassThresholds, EnvironmentReader, EnvironmentalDriver, PulseCounter,
    PulseSource, WindVane,
};
use crate::settings::StationSettings;

use super::reducers::{
    EnvironmentReducer, RainReducer, Reducer, WindDirectionReducer, WindSpeedReducer,
};
use super::worker::reduction_loop;

/// The four pieces of hardware a station samples.
pub struct StationSources {
    pub environment: Box<dyn EnvironmentalDriver>,
    pub wind_vane: Box<dyn AnalogSource>,
    pub anemometer: Box<dyn PulseSource>,
    pub rain_gauge: Box<dyn PulseSource>,
}

/// Owns the samplers, one reduction worker per sampler, and the reading
/// store they all write to. Every changed batch goes out on `batches`.
pub struct Aggregator {
    store: ReadingStore,
    samplers: Vec<Box<dyn ManagedSampler>>,
    workers: Vec<JoinHandle<()>>,
    cancel_token: CancellationToken,
}

impl Aggregator {
    /// Validate `settings`, build every sampler, then start them all.
    /// Readings without a sensor timestamp are stamped from `clock`.
    ///
    /// Nothing is started if any part of the configuration is rejected.
    pub fn start(
        settings: &StationSettings,
        sources: StationSources,
        clock: Arc<dyn Clock>,
        batches: mpsc::UnboundedSender<ReadingBatch>,
    ) -> Result<Self> {
        settings.validate()?;
        let runtime =
            Handle::try_current().context("aggregator must be started inside a Tokio runtime")?;

        let thresholds = CompassThresholds::standard(settings.wind_vane_pull_up_ohms)?;
        let environment = EnvironmentReader::new(sources.environment)
            .context("failed to initialise environmental sensor")?;

        let mut aggregator = Self {
            store: ReadingStore::with_clock(clock),
            samplers: Vec::with_capacity(4),
            workers: Vec::with_capacity(4),
            cancel_token: CancellationToken::new(),
        };

        let depth = settings.snapshot_queue_depth;
        aggregator.attach(
            &runtime,
            environment,
            settings.air.sampler_config("air")?,
            EnvironmentReducer,
            depth,
            &batches,
        );
        aggregator.attach(
            &runtime,
            WindVane::new(sources.wind_vane, thresholds),
            settings.wind_direction.sampler_config("wind_direction")?,
            WindDirectionReducer,
            depth,
            &batches,
        );
        aggregator.attach(
            &runtime,
            PulseCounter::new("wind_speed", sources.anemometer),
            settings.wind_speed.sampler_config("wind_speed")?,
            WindSpeedReducer {
                kmh_per_hz: settings.anemometer_kmh_per_hz,
            },
            depth,
            &batches,
        );
        aggregator.attach(
            &runtime,
            PulseCounter::new("rain", sources.rain_gauge),
            settings.rain.sampler_config("rain")?,
            RainReducer {
                mm_per_tip: settings.rain_mm_per_tip,
            },
            depth,
            &batches,
        );

        let started = aggregator
            .samplers
            .iter_mut()
            .try_for_each(|sampler| sampler.start());
        if let Err(err) = started {
            aggregator.cancel_all();
            return Err(err);
        }

        info!("aggregator started with {} samplers", aggregator.samplers.len());
        Ok(aggregator)
    }

    fn attach<S, R>(
        &mut self,
        runtime: &Handle,
        strategy: S,
        config: SamplerConfig,
        reducer: R,
        depth: usize,
        batches: &mpsc::UnboundedSender<ReadingBatch>,
    ) where
        S: AcquisitionStrategy,
        R: Reducer<Sample = S::Sample>,
    {
        let (tx, rx) = mpsc::channel(depth);
        let sampler = Sampler::new(strategy, config).with_snapshots(tx);

        self.workers.push(runtime.spawn(reduction_loop(
            reducer,
            rx,
            self.store.clone(),
            batches.clone(),
            self.cancel_token.child_token(),
        )));
        self.samplers.push(Box::new(sampler));
    }

    /// Current reading for a published key name.
    pub fn reading(&self, name: &str) -> Result<SensorReading, UnknownReadingKey> {
        self.store.lookup(name)
    }

    pub fn readings(&self) -> ReadingBatch {
        self.store.snapshot()
    }

    pub fn units(&self) -> Vec<(ReadingKey, &'static str)> {
        self.store.units()
    }

    pub fn sampler_statuses(&self) -> Vec<(&'static str, SamplerStatus)> {
        self.samplers
            .iter()
            .map(|sampler| (sampler.name(), sampler.status()))
            .collect()
    }

    fn cancel_all(&mut self) {
        for sampler in &mut self.samplers {
            sampler.cancel();
        }
        self.cancel_token.cancel();
    }

    /// Cancel every sampler and wait for the reduction workers to finish.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.cancel_all();

        for worker in self.workers.drain(..) {
            worker.await.context("reduction worker failed to join")?;
        }
        info!("aggregator stopped");
        Ok(())
    }
}

impl Drop for Aggregator {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
