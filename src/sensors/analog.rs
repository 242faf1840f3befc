use crate::errors::{SamplingError, SamplingResult};
use crate::sampling::AcquisitionStrategy;

use super::AnalogSource;

/// Instantaneous analog value.
pub struct AnalogReader {
    name: &'static str,
    source: Box<dyn AnalogSource>,
}

impl AnalogReader {
    pub fn new(name: &'static str, source: Box<dyn AnalogSource>) -> Self {
        Self { name, source }
    }
}

impl AcquisitionStrategy for AnalogReader {
    type Sample = f64;

    fn name(&self) -> &'static str {
        self.name
    }

    fn acquire(&mut self) -> SamplingResult<f64> {
        let value = self.source.read()?;
        if !value.is_finite() {
            return Err(SamplingError::acquisition(self.name, format!("non-finite reading {value}")));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::simulated::FixedAnalogSource;

    #[test]
    fn returns_the_source_value() {
        let mut reader = AnalogReader::new("adc0", Box::new(FixedAnalogSource::new(0.42)));
        assert_eq!(reader.acquire().unwrap(), 0.42);
    }

    #[test]
    fn rejects_nan() {
        let mut reader = AnalogReader::new("adc0", Box::new(FixedAnalogSource::new(f64::NAN)));
        assert!(matches!(
            reader.acquire(),
            Err(SamplingError::Acquisition { source_name: "adc0", .. })
        ));
    }
}
