use crate::errors::{SamplingError, SamplingResult};
use crate::sampling::AcquisitionStrategy;

use super::{Calibration, EnvironmentSample, EnvironmentalDriver};

/// Temperature, humidity and pressure from one driver transaction.
pub struct EnvironmentReader {
    driver: Box<dyn EnvironmentalDriver>,
    calibration: Calibration,
}

impl EnvironmentReader {
    /// Reads the calibration blob once, up front.
    pub fn new(mut driver: Box<dyn EnvironmentalDriver>) -> SamplingResult<Self> {
        let calibration = driver.load_calibration()?;
        Ok(Self {
            driver,
            calibration,
        })
    }
}

impl AcquisitionStrategy for EnvironmentReader {
    type Sample = EnvironmentSample;

    fn name(&self) -> &'static str {
        "environment"
    }

    fn acquire(&mut self) -> SamplingResult<EnvironmentSample> {
        let sample = self.driver.sample(&self.calibration)?;
        for (field, value) in [
            ("temperature", sample.temperature),
            ("humidity", sample.humidity),
            ("pressure", sample.pressure),
        ] {
            if !value.is_finite() {
                return Err(SamplingError::acquisition(
                    "environment",
                    format!("non-finite {field} {value}"),
                ));
            }
        }
        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::simulated::ScriptedEnvironment;
    use chrono::{TimeZone, Utc};

    #[test]
    fn passes_driver_samples_through() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let sample = EnvironmentSample {
            temperature: 21.3,
            humidity: 48.0,
            pressure: 1012.6,
            timestamp: at,
        };
        let driver = ScriptedEnvironment::new(vec![Ok(sample)]);
        let mut reader = EnvironmentReader::new(Box::new(driver)).unwrap();

        assert_eq!(reader.acquire().unwrap(), sample);
    }

    #[test]
    fn driver_errors_surface_as_acquisition_failures() {
        let driver = ScriptedEnvironment::new(vec![Err(SamplingError::acquisition(
            "environment",
            "i2c read failed",
        ))]);
        let mut reader = EnvironmentReader::new(Box::new(driver)).unwrap();

        assert!(matches!(
            reader.acquire(),
            Err(SamplingError::Acquisition { .. })
        ));
    }

    #[test]
    fn non_finite_driver_values_are_acquisition_failures() {
        let good = EnvironmentSample {
            temperature: 10.0,
            humidity: 70.0,
            pressure: 1001.0,
            timestamp: Utc::now(),
        };
        let driver = ScriptedEnvironment::new(vec![
            Ok(EnvironmentSample {
                humidity: f64::NAN,
                ..good
            }),
            Ok(EnvironmentSample {
                pressure: f64::INFINITY,
                ..good
            }),
            Ok(good),
        ]);
        let mut reader = EnvironmentReader::new(Box::new(driver)).unwrap();

        assert!(matches!(
            reader.acquire(),
            Err(SamplingError::Acquisition { .. })
        ));
        assert!(matches!(
            reader.acquire(),
            Err(SamplingError::Acquisition { .. })
        ));
        assert_eq!(reader.acquire().unwrap(), good);
    }

    #[test]
    fn calibration_failure_rejects_construction() {
        let driver = ScriptedEnvironment::new(Vec::new()).with_failing_calibration();
        assert!(EnvironmentReader::new(Box::new(driver)).is_err());
    }
}
