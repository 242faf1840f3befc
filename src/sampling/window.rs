//! Bounded sample history with oldest-first eviction.

use std::{collections::VecDeque, time::Duration};

use chrono::{DateTime, Utc};

use crate::errors::{SamplingError, SamplingResult};

/// Sampling cadence plus how much history to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerConfig {
    interval: Duration,
    retention: Duration,
    capacity: usize,
}

impl SamplerConfig {
    /// Capacity is `floor(retention / interval)`. A zero interval or a
    /// retention shorter than one interval is rejected.
    pub fn new(interval: Duration, retention: Duration) -> SamplingResult<Self> {
        if interval.is_zero() {
            return Err(SamplingError::configuration("sampling interval must be non-zero"));
        }
        if retention < interval {
            return Err(SamplingError::configuration(format!(
                "retention {}s is shorter than sampling interval {}s",
                retention.as_secs_f64(),
                interval.as_secs_f64()
            )));
        }

        let capacity = (retention.as_nanos() / interval.as_nanos()) as usize;
        Ok(Self {
            interval,
            retention,
            capacity,
        })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[derive(Debug, Clone)]
pub struct SlidingWindow<T> {
    samples: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> SlidingWindow<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, returning the evicted oldest sample once full.
    pub fn push(&mut self, sample: T) -> Option<T> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&T> {
        self.samples.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.samples.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.samples.iter().cloned().collect()
    }

    pub fn snapshot(&self, interval: Duration) -> WindowSnapshot<T> {
        WindowSnapshot {
            samples: self.to_vec(),
            interval,
            capacity: self.capacity,
            taken_at: Utc::now(),
        }
    }
}

/// Immutable copy of a window, handed to reducers.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot<T> {
    pub samples: Vec<T>,
    pub interval: Duration,
    pub capacity: usize,
    pub taken_at: DateTime<Utc>,
}

impl<T> WindowSnapshot<T> {
    pub fn new(samples: Vec<T>, interval: Duration) -> Self {
        let capacity = samples.len();
        Self {
            samples,
            interval,
            capacity,
            taken_at: Utc::now(),
        }
    }

    pub fn latest(&self) -> Option<&T> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn interval_secs(&self) -> f64 {
        self.interval.as_secs_f64()
    }
}
