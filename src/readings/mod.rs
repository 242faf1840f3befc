pub mod model;
pub mod store;

pub use model::{Precision, ReadingKey, SensorReading, TimestampOrigin, UnknownReadingKey};
pub use store::{ReadingBatch, ReadingStore, ReadingUpdate};
