//! Pure reductions from sample windows to meteorological quantities.
//!
//! Nothing in here rounds; callers quantize through [`ReadingKey`].
//!
//! [`ReadingKey`]: crate::readings::ReadingKey

mod accumulation;
mod circular;
mod psychrometrics;
mod trend;

pub use accumulation::{anemometer_scale, gust, mean_speed, samples_per_period, trailing_total};
pub use circular::circular_mean;
pub use psychrometrics::dew_point;
pub use trend::{hourly_trend, trend};
