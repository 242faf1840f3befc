use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
    time::Duration,
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::{SamplingError, SamplingResult};
use crate::sampling::SamplerConfig;

pub const SETTINGS_PATH_ENV: &str = "WEATHERSTATION_SETTINGS";
const DEFAULT_SETTINGS_FILE: &str = "weatherstation.json";

/// Cadence and history length for one sampler, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SamplingSettings {
    pub interval_secs: f64,
    pub retention_secs: f64,
}

impl SamplingSettings {
    pub const fn new(interval_secs: f64, retention_secs: f64) -> Self {
        Self {
            interval_secs,
            retention_secs,
        }
    }

    pub fn sampler_config(&self, sampler: &str) -> SamplingResult<SamplerConfig> {
        let interval = seconds(sampler, "interval", self.interval_secs)?;
        let retention = seconds(sampler, "retention", self.retention_secs)?;
        SamplerConfig::new(interval, retention).map_err(|err| match err {
            SamplingError::Configuration { reason } => {
                SamplingError::configuration(format!("{sampler}: {reason}"))
            }
            other => other,
        })
    }
}

fn seconds(sampler: &str, field: &str, value: f64) -> SamplingResult<Duration> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        SamplingError::configuration(format!("{sampler}: {field} of {value}s is not a duration"))
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct StationSettings {
    pub air: SamplingSettings,
    pub rain: SamplingSettings,
    pub wind_speed: SamplingSettings,
    pub wind_direction: SamplingSettings,
    pub rain_mm_per_tip: f64,
    pub anemometer_kmh_per_hz: f64,
    pub wind_vane_pull_up_ohms: f64,
    pub snapshot_queue_depth: usize,
    pub log_level: String,
}

impl Default for StationSettings {
    fn default() -> Self {
        // 3h of air history for reporting pressure tendency; 3s wind speed
        // interval for gusts.
        let wind_speed = SamplingSettings::new(3.0, 600.0);
        Self {
            air: SamplingSettings::new(60.0, 3.0 * 3600.0),
            rain: SamplingSettings::new(300.0, 24.0 * 3600.0),
            wind_direction: SamplingSettings::new(1.0, wind_speed.interval_secs),
            wind_speed,
            rain_mm_per_tip: 0.2794,
            anemometer_kmh_per_hz: 2.4,
            wind_vane_pull_up_ohms: 4700.0,
            snapshot_queue_depth: 16,
            log_level: "info".into(),
        }
    }
}

impl StationSettings {
    /// Reject anything that would stop a sampler from being built.
    pub fn validate(&self) -> SamplingResult<()> {
        self.air.sampler_config("air")?;
        self.rain.sampler_config("rain")?;
        self.wind_speed.sampler_config("wind_speed")?;
        self.wind_direction.sampler_config("wind_direction")?;

        for (field, value) in [
            ("rainMmPerTip", self.rain_mm_per_tip),
            ("anemometerKmhPerHz", self.anemometer_kmh_per_hz),
            ("windVanePullUpOhms", self.wind_vane_pull_up_ohms),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SamplingError::configuration(format!(
                    "{field} must be positive, got {value}"
                )));
            }
        }

        if self.snapshot_queue_depth == 0 {
            return Err(SamplingError::configuration(
                "snapshotQueueDepth must be at least 1",
            ));
        }
        Ok(())
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<StationSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            read_settings(&path)?
        } else {
            StationSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// Store at `$WEATHERSTATION_SETTINGS`, or `weatherstation.json`.
    pub fn from_env() -> Result<Self> {
        let path = env::var_os(SETTINGS_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn settings(&self) -> StationSettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn update(&self, settings: StationSettings) -> Result<()> {
        settings.validate()?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let data = read_settings(&self.path)?;
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &StationSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}

fn read_settings(path: &Path) -> Result<StationSettings> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid settings in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scratch_path(tag: &str) -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        env::temp_dir().join(format!(
            "weatherstation-{tag}-{}-{n}.json",
            std::process::id()
        ))
    }

    #[test]
    fn defaults_match_station_layout() {
        let settings = StationSettings::default();
        assert!(settings.validate().is_ok());

        assert_eq!(settings.air.sampler_config("air").unwrap().capacity(), 180);
        assert_eq!(settings.rain.sampler_config("rain").unwrap().capacity(), 288);
        assert_eq!(
            settings.wind_speed.sampler_config("wind_speed").unwrap().capacity(),
            200
        );
        assert_eq!(
            settings
                .wind_direction
                .sampler_config("wind_direction")
                .unwrap()
                .capacity(),
            3
        );
    }

    #[test]
    fn retention_shorter_than_interval_is_rejected() {
        let mut settings = StationSettings::default();
        settings.rain = SamplingSettings::new(300.0, 60.0);

        let err = settings.validate().unwrap_err();
        assert!(matches!(err, SamplingError::Configuration { .. }));
        assert!(err.to_string().contains("rain"));
    }

    #[test]
    fn zero_and_negative_values_are_rejected() {
        let mut settings = StationSettings::default();
        settings.wind_direction = SamplingSettings::new(0.0, 3.0);
        assert!(settings.validate().is_err());

        let mut settings = StationSettings::default();
        settings.air = SamplingSettings::new(-1.0, 60.0);
        assert!(settings.validate().is_err());

        let mut settings = StationSettings::default();
        settings.rain_mm_per_tip = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = StationSettings::default();
        settings.snapshot_queue_depth = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let store = SettingsStore::new(scratch_path("missing")).unwrap();
        assert_eq!(store.settings(), StationSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let path = scratch_path("partial");
        fs::write(&path, r#"{ "rainMmPerTip": 0.3, "air": { "intervalSecs": 30, "retentionSecs": 3600 } }"#)
            .unwrap();

        let store = SettingsStore::new(path.clone()).unwrap();
        let settings = store.settings();
        assert_eq!(settings.rain_mm_per_tip, 0.3);
        assert_eq!(settings.air, SamplingSettings::new(30.0, 3600.0));
        assert_eq!(settings.anemometer_kmh_per_hz, 2.4);

        fs::remove_file(path).ok();
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let path = scratch_path("unknown");
        fs::write(&path, r#"{ "rainScale": 0.3 }"#).unwrap();

        assert!(SettingsStore::new(path.clone()).is_err());
        fs::remove_file(path).ok();
    }

    #[test]
    fn update_persists_and_reload_reads_back() {
        let path = scratch_path("update");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.snapshot_queue_depth = 4;
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.settings(), settings);

        fs::write(&path, r#"{ "logLevel": "debug" }"#).unwrap();
        reopened.reload().unwrap();
        assert_eq!(reopened.settings().log_level, "debug");
        assert_eq!(reopened.settings().snapshot_queue_depth, 16);

        fs::remove_file(path).ok();
    }

    #[test]
    fn invalid_update_is_not_persisted() {
        let path = scratch_path("invalid");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.settings();
        settings.wind_speed = SamplingSettings::new(3.0, 1.0);
        assert!(store.update(settings).is_err());
        assert!(!path.exists());
        assert_eq!(store.settings(), StationSettings::default());
    }
}
