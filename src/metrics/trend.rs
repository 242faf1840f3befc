/// Least-squares slope of `series` against its index (0, 1, 2, ...).
///
/// Series of length 0 or 1 have no slope and yield 0.
pub fn trend(series: &[f64]) -> f64 {
    let n = series.len();
    if n <= 1 {
        return 0.0;
    }

    let count = n as f64;
    let mean_x = (count - 1.0) / 2.0;
    let mean_y = series.iter().sum::<f64>() / count;

    let (mut covariance, mut variance) = (0.0, 0.0);
    for (index, value) in series.iter().enumerate() {
        let dx = index as f64 - mean_x;
        covariance += dx * (value - mean_y);
        variance += dx * dx;
    }

    covariance / variance
}

/// Slope expressed per hour for samples taken every `interval_secs`.
pub fn hourly_trend(series: &[f64], interval_secs: f64) -> f64 {
    if interval_secs <= 0.0 {
        return 0.0;
    }
    trend(series) * 3600.0 / interval_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_series_are_flat() {
        assert_eq!(trend(&[]), 0.0);
        assert_eq!(trend(&[1013.0]), 0.0);
        assert_eq!(hourly_trend(&[21.5], 60.0), 0.0);
    }

    #[test]
    fn rising_by_one_per_minute_is_sixty_per_hour() {
        assert!((hourly_trend(&[1.0, 2.0, 3.0], 60.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn noisy_series_uses_least_squares() {
        let series = [0.5, 1.5, 4.5, 5.5];
        assert!((trend(&series) - 1.8).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn slope_of_a_line_is_recovered(
            intercept in -1000.0f64..1000.0,
            slope in -5.0f64..5.0,
            len in 2usize..200,
        ) {
            let series: Vec<f64> = (0..len).map(|i| intercept + slope * i as f64).collect();
            prop_assert!((trend(&series) - slope).abs() < 1e-6);
        }

        #[test]
        fn constant_series_have_zero_trend(value in -50.0f64..50.0, len in 0usize..100) {
            let series = vec![value; len];
            prop_assert!(trend(&series).abs() < 1e-9);
        }
    }
}
