use crate::errors::{SamplingError, SamplingResult};
use crate::sampling::AcquisitionStrategy;

use super::AnalogSource;

/// Vane resistance per compass heading (degrees, ohms), sorted by
/// decreasing resistance.
pub const RESISTANCE_BY_ANGLE: [(f64, f64); 16] = [
    (270.0, 120_000.0),
    (315.0, 64_900.0),
    (292.5, 42_120.0),
    (0.0, 33_000.0),
    (337.5, 21_880.0),
    (225.0, 16_000.0),
    (247.5, 14_120.0),
    (45.0, 8_200.0),
    (22.5, 6_570.0),
    (180.0, 3_900.0),
    (202.5, 3_140.0),
    (135.0, 2_200.0),
    (157.5, 1_410.0),
    (90.0, 1_000.0),
    (67.5, 891.0),
    (112.5, 668.0),
];

#[derive(Debug, Clone, Copy, PartialEq)]
struct CompassPoint {
    angle: f64,
    ratio: f64,
    threshold: f64,
}

/// Upper ratio bound per heading for a vane behind a pull-up resistor.
///
/// Each bound sits halfway between neighbouring divider ratios; the last
/// heading catches everything up to 1.0.
#[derive(Debug, Clone, PartialEq)]
pub struct CompassThresholds {
    points: Vec<CompassPoint>,
}

impl CompassThresholds {
    pub fn new(pull_up_ohms: f64, table: &[(f64, f64)]) -> SamplingResult<Self> {
        if !(pull_up_ohms.is_finite() && pull_up_ohms > 0.0) {
            return Err(SamplingError::configuration(format!(
                "wind vane pull-up must be positive, got {pull_up_ohms}"
            )));
        }
        if table.is_empty() {
            return Err(SamplingError::configuration("wind vane table is empty"));
        }
        if table.windows(2).any(|pair| pair[0].1 <= pair[1].1) {
            return Err(SamplingError::configuration(
                "wind vane table must be sorted by decreasing resistance",
            ));
        }

        let ratios: Vec<f64> = table
            .iter()
            .map(|&(_, resistance)| pull_up_ohms / (pull_up_ohms + resistance))
            .collect();

        let points = table
            .iter()
            .enumerate()
            .map(|(i, &(angle, _))| {
                let threshold = match ratios.get(i + 1) {
                    Some(next) => (ratios[i] + next) / 2.0,
                    None => 1.0,
                };
                CompassPoint {
                    angle,
                    ratio: ratios[i],
                    threshold,
                }
            })
            .collect();

        Ok(Self { points })
    }

    pub fn standard(pull_up_ohms: f64) -> SamplingResult<Self> {
        Self::new(pull_up_ohms, &RESISTANCE_BY_ANGLE)
    }

    /// Heading for a sampled ratio, `None` above the catch-all bound.
    pub fn classify(&self, ratio: f64) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.threshold >= ratio)
            .map(|point| point.angle)
    }

    /// Ideal divider ratio for `angle`, if it is in the table.
    pub fn ratio_for(&self, angle: f64) -> Option<f64> {
        self.points
            .iter()
            .find(|point| point.angle == angle)
            .map(|point| point.ratio)
    }

    pub fn angles(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|point| point.angle)
    }
}

/// Samples the vane and reports a compass heading in degrees.
pub struct WindVane {
    source: Box<dyn AnalogSource>,
    thresholds: CompassThresholds,
}

impl WindVane {
    pub fn new(source: Box<dyn AnalogSource>, thresholds: CompassThresholds) -> Self {
        Self { source, thresholds }
    }
}

impl AcquisitionStrategy for WindVane {
    type Sample = f64;

    fn name(&self) -> &'static str {
        "wind_direction"
    }

    fn acquire(&mut self) -> SamplingResult<f64> {
        let ratio = self.source.read()?;
        self.thresholds
            .classify(ratio)
            .ok_or(SamplingError::Classification { ratio })
    }
}
