const B: f64 = 18.678;
const C: f64 = 257.14;

/// Dew point (°C) from air temperature (°C) and relative humidity (%).
pub fn dew_point(temperature: f64, humidity: f64) -> f64 {
    let gamma = (humidity / 100.0).ln() + B * temperature / (C + temperature);
    C * gamma / (B - gamma)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moderate_conditions() {
        let dew = dew_point(20.0, 50.0);
        assert!((dew - 9.3).abs() < 0.05, "{dew}");
    }

    #[test]
    fn saturated_air_dews_at_air_temperature() {
        assert!((dew_point(15.0, 100.0) - 15.0).abs() < 1e-9);
    }

    #[test]
    fn drier_air_has_lower_dew_point() {
        assert!(dew_point(25.0, 30.0) < dew_point(25.0, 60.0));
    }
}
