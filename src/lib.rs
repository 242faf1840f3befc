pub mod aggregator;
pub mod clock;
pub mod errors;
pub mod metrics;
pub mod publish;
pub mod readings;
pub mod reconciler;
pub mod sampling;
pub mod sensors;
pub mod settings;
pub mod station;
pub mod timer;
pub mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use aggregator::StationSources;
use clock::SystemClock;
use publish::{LifecycleState, LoggingPublisher, Topics};
use sensors::simulated::{DriftingAnalogSource, SimulatedEnvironment, SimulatedPulseSource};
use settings::{SettingsStore, StationSettings};
use station::Station;

fn simulated_sources() -> StationSources {
    StationSources {
        environment: Box::new(SimulatedEnvironment::default()),
        wind_vane: Box::new(DriftingAnalogSource::new(0.5, 0.02)),
        anemometer: Box::new(SimulatedPulseSource::new("anemometer", 4.0)),
        rain_gauge: Box::new(SimulatedPulseSource::new("rain_gauge", 0.02)),
    }
}

async fn serve(settings: StationSettings) -> Result<()> {
    let publisher = Arc::new(LoggingPublisher::new(Topics::default()));
    publisher.announce(LifecycleState::Init);

    let station = Station::start(
        &settings,
        simulated_sources(),
        Arc::new(SystemClock),
        publisher.clone(),
    )?;
    publisher.announce_units(&station.aggregator().units());
    publisher.announce(LifecycleState::Ready);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    info!("shutting down");
    publisher.announce(LifecycleState::Lost);
    station.shutdown().await?;
    Ok(())
}

pub fn run() -> Result<()> {
    let store = SettingsStore::from_env()?;
    let settings = store.settings();
    settings.validate()?;

    utils::logging::init(&settings.log_level);
    info!(
        "weather station starting, settings from {}",
        store.path().display()
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build Tokio runtime")?;

    runtime.block_on(serve(settings))
}
