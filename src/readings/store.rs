use std::{
    collections::BTreeMap,
    sync::{Arc, PoisonError, RwLock},
};

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock};

use super::model::{ReadingKey, SensorReading, UnknownReadingKey};

/// Changed readings, keyed in schema order.
pub type ReadingBatch = BTreeMap<ReadingKey, SensorReading>;

/// A freshly derived value for one key, already at published precision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadingUpdate {
    pub key: ReadingKey,
    pub value: f64,
    pub timestamp: Option<DateTime<Utc>>,
}

impl ReadingUpdate {
    pub fn new(key: ReadingKey, value: f64, timestamp: Option<DateTime<Utc>>) -> Self {
        Self {
            key,
            value: key.quantize(value),
            timestamp,
        }
    }
}

/// Current value, unit and timestamp for every [`ReadingKey`].
///
/// All keys exist from construction; callers outside the aggregator only
/// ever get copies. Updates without a sensor timestamp are stamped from the
/// store's clock.
#[derive(Clone)]
pub struct ReadingStore {
    inner: Arc<RwLock<BTreeMap<ReadingKey, SensorReading>>>,
    clock: Arc<dyn Clock>,
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadingStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let readings = ReadingKey::ALL
            .iter()
            .map(|key| (*key, SensorReading::new(key.unit(), now)))
            .collect();

        Self {
            inner: Arc::new(RwLock::new(readings)),
            clock,
        }
    }

    pub fn get(&self, key: ReadingKey) -> SensorReading {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
            .unwrap_or_else(|| SensorReading::new(key.unit(), self.clock.now()))
    }

    /// Lookup by published name.
    pub fn lookup(&self, name: &str) -> Result<SensorReading, UnknownReadingKey> {
        let key = name.parse::<ReadingKey>()?;
        Ok(self.get(key))
    }

    pub fn snapshot(&self) -> ReadingBatch {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn units(&self) -> Vec<(ReadingKey, &'static str)> {
        ReadingKey::ALL.iter().map(|key| (*key, key.unit())).collect()
    }

    /// Apply updates under one short write lock and return exactly the
    /// touched entries.
    pub fn apply(&self, updates: &[ReadingUpdate]) -> ReadingBatch {
        let now = self.clock.now();
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut batch = ReadingBatch::new();

        for update in updates {
            let reading = guard
                .entry(update.key)
                .or_insert_with(|| SensorReading::new(update.key.unit(), now));
            reading.update(Some(update.value), update.timestamp, now);
            batch.insert(update.key, reading.clone());
        }

        batch
    }
}
