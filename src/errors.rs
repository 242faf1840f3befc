//! Typed errors for the sampling core.
//!
//! Acquisition and classification failures never escape a sampler: they are
//! handed to an [`ErrorSink`] and the tick is skipped. Configuration errors
//! are returned to whoever is constructing the sampler or station.

use log::warn;
use thiserror::Error;

pub type SamplingResult<T> = Result<T, SamplingError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SamplingError {
    /// A hardware read failed (bus error, timeout, driver fault).
    #[error("{source_name}: acquisition failed: {details}")]
    Acquisition {
        source_name: &'static str,
        details: String,
    },

    /// An analog ratio fell above every wind-vane threshold.
    #[error("wind vane ratio {ratio} matches no compass heading")]
    Classification { ratio: f64 },

    /// Rejected at construction, before any sampler runs.
    #[error("invalid configuration: {reason}")]
    Configuration { reason: String },
}

impl SamplingError {
    pub fn acquisition(source_name: &'static str, details: impl Into<String>) -> Self {
        Self::Acquisition {
            source_name,
            details: details.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }
}

/// Destination for failures that are recovered inside a sampler.
pub trait ErrorSink: Send + Sync {
    fn report(&self, sampler: &str, error: &SamplingError);
}

/// Default sink: every recovered failure becomes a warning.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, sampler: &str, error: &SamplingError) {
        warn!("sampler {sampler}: {error}; tick skipped");
    }
}
