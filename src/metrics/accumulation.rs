use std::time::Duration;

const KMH_PER_MS: f64 = 3.6;

/// Factor turning per-interval pulse counts into m/s.
pub fn anemometer_scale(kmh_per_hz: f64, interval_secs: f64) -> f64 {
    (kmh_per_hz / interval_secs) / KMH_PER_MS
}

pub fn gust(counts: &[u64], scale: f64) -> f64 {
    counts.iter().copied().max().unwrap_or(0) as f64 * scale
}

pub fn mean_speed(counts: &[u64], scale: f64) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    counts.iter().sum::<u64>() as f64 / counts.len() as f64 * scale
}

/// How many samples taken every `interval` cover `period`, rounded.
pub fn samples_per_period(period: Duration, interval: Duration) -> usize {
    if interval.is_zero() {
        return 0;
    }
    (period.as_secs_f64() / interval.as_secs_f64()).round() as usize
}

/// Sum of the trailing `count` samples (all of them if fewer) times `scale`.
pub fn trailing_total(counts: &[u64], count: usize, scale: f64) -> f64 {
    let start = counts.len().saturating_sub(count);
    counts[start..].iter().sum::<u64>() as f64 * scale
}
