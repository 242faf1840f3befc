/// Mean heading of `angles` (degrees) in `[0, 360)`.
///
/// Uses the mean sine and cosine; a zero mean cosine is treated as an arc of
/// 90 degrees instead of dividing. Returns `None` for an empty slice.
pub fn circular_mean(angles: &[f64]) -> Option<f64> {
    if angles.is_empty() {
        return None;
    }

    let (sin_sum, cos_sum) = angles.iter().fold((0.0, 0.0), |(s, c), angle| {
        let radians = angle.to_radians();
        (s + radians.sin(), c + radians.cos())
    });

    let count = angles.len() as f64;
    Some(heading_from_means(sin_sum / count, cos_sum / count))
}

fn heading_from_means(sin_mean: f64, cos_mean: f64) -> f64 {
    let arc = if cos_mean == 0.0 {
        90.0
    } else {
        (sin_mean / cos_mean).atan().to_degrees()
    };

    let mean = if (cos_mean > 0.0 && sin_mean >= 0.0) || (cos_mean == 0.0 && sin_mean > 0.0) {
        arc
    } else if cos_mean <= 0.0 {
        arc + 180.0
    } else {
        arc + 360.0
    };

    if mean >= 360.0 {
        mean - 360.0
    } else {
        mean
    }
}
