use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::clock::Clock;
use crate::readings::{ReadingBatch, ReadingKey};

/// What the reconciler hands downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OutboundEvent {
    #[serde(rename_all = "camelCase")]
    Reading {
        key: ReadingKey,
        value: Option<f64>,
        unit: &'static str,
        timestamp: DateTime<Utc>,
    },
    /// The observation clock moved; seconds since the Unix epoch.
    #[serde(rename_all = "camelCase")]
    Clock { epoch_seconds: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Forwarded {
    value: Option<f64>,
    timestamp: DateTime<Utc>,
}

/// Merges aggregator batches into one ordered event stream.
///
/// Keeps the last forwarded value per key and a shared observation clock.
/// Sensor timestamps only ever push the clock forward. A batch carrying
/// readings without one stamps them with the clock, then moves it on by a
/// second.
pub struct Reconciler {
    clock: Arc<dyn Clock>,
    observation_clock: Option<DateTime<Utc>>,
    forwarded: BTreeMap<ReadingKey, Forwarded>,
}

impl Reconciler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            observation_clock: None,
            forwarded: BTreeMap::new(),
        }
    }

    pub fn observation_clock(&self) -> Option<DateTime<Utc>> {
        self.observation_clock
    }

    pub fn last_value(&self, key: ReadingKey) -> Option<f64> {
        self.forwarded.get(&key).and_then(|entry| entry.value)
    }

    /// Forget every forwarded value and the clock.
    pub fn reset(&mut self) {
        self.observation_clock = None;
        self.forwarded.clear();
    }

    pub fn merge(&mut self, batch: &ReadingBatch) -> Vec<OutboundEvent> {
        let before = self.observation_clock;

        for reading in batch.values().filter(|reading| reading.has_sensor_timestamp()) {
            self.ratchet(reading.timestamp);
        }

        let stamp = if batch.values().any(|reading| !reading.has_sensor_timestamp()) {
            Some(match self.observation_clock {
                Some(at) => at,
                None => self.clock.now(),
            })
        } else {
            None
        };

        let mut events = Vec::with_capacity(batch.len() + 1);
        for (key, reading) in batch {
            let timestamp = match stamp {
                Some(at) if !reading.has_sensor_timestamp() => at,
                _ => reading.timestamp,
            };

            let entry = self.forwarded.entry(*key).or_insert(Forwarded {
                value: reading.value,
                timestamp,
            });
            if entry.value.is_none() || entry.value != reading.value {
                entry.value = reading.value;
                entry.timestamp = timestamp;
            }

            events.push(OutboundEvent::Reading {
                key: *key,
                value: entry.value,
                unit: reading.unit(),
                timestamp: entry.timestamp,
            });
        }

        if let Some(at) = stamp {
            self.observation_clock = Some(at + Duration::seconds(1));
        }

        if let Some(now) = self.observation_clock.filter(|now| Some(*now) != before) {
            events.push(OutboundEvent::Clock {
                epoch_seconds: now.timestamp(),
            });
        }

        events
    }

    fn ratchet(&mut self, candidate: DateTime<Utc>) {
        if self.observation_clock.map_or(true, |current| candidate > current) {
            self.observation_clock = Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::clock::ManualClock;
    use crate::readings::SensorReading;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
    }

    fn reconciler() -> Reconciler {
        Reconciler::new(Arc::new(ManualClock::new(start())))
    }

    fn batch(entries: &[(ReadingKey, f64, Option<DateTime<Utc>>)]) -> ReadingBatch {
        entries
            .iter()
            .map(|(key, value, at)| {
                let reading = SensorReading::with_value(Some(*value), key.unit(), *at, start());
                (*key, reading)
            })
            .collect()
    }

    fn readings(events: &[OutboundEvent]) -> Vec<(ReadingKey, Option<f64>, DateTime<Utc>)> {
        events
            .iter()
            .filter_map(|event| match event {
                OutboundEvent::Reading {
                    key,
                    value,
                    timestamp,
                    ..
                } => Some((*key, *value, *timestamp)),
                OutboundEvent::Clock { .. } => None,
            })
            .collect()
    }

    fn clock_events(events: &[OutboundEvent]) -> Vec<i64> {
        events
            .iter()
            .filter_map(|event| match event {
                OutboundEvent::Clock { epoch_seconds } => Some(*epoch_seconds),
                OutboundEvent::Reading { .. } => None,
            })
            .collect()
    }

    #[test]
    fn first_sighting_is_forwarded_verbatim() {
        let mut reconciler = reconciler();
        let at = start() + Duration::minutes(5);

        let events = reconciler.merge(&batch(&[(ReadingKey::Temperature, 12.5, Some(at))]));

        assert_eq!(readings(&events), vec![(ReadingKey::Temperature, Some(12.5), at)]);
        assert_eq!(clock_events(&events), vec![at.timestamp()]);
        assert!(matches!(
            events[0],
            OutboundEvent::Reading { unit: "°C", .. }
        ));
    }

    #[test]
    fn unchanged_value_is_still_forwarded_with_its_first_timestamp() {
        let mut reconciler = reconciler();
        let first = start() + Duration::minutes(1);
        let second = start() + Duration::minutes(2);

        reconciler.merge(&batch(&[(ReadingKey::Pressure, 1012.0, Some(first))]));
        let events = reconciler.merge(&batch(&[(ReadingKey::Pressure, 1012.0, Some(second))]));

        assert_eq!(readings(&events), vec![(ReadingKey::Pressure, Some(1012.0), first)]);
        // the clock still follows the newer sensor time
        assert_eq!(clock_events(&events), vec![second.timestamp()]);
    }

    #[test]
    fn changed_value_takes_the_new_timestamp() {
        let mut reconciler = reconciler();
        let first = start() + Duration::minutes(1);
        let second = start() + Duration::minutes(2);

        reconciler.merge(&batch(&[(ReadingKey::Humidity, 60.0, Some(first))]));
        let events = reconciler.merge(&batch(&[(ReadingKey::Humidity, 61.0, Some(second))]));

        assert_eq!(readings(&events), vec![(ReadingKey::Humidity, Some(61.0), second)]);
        assert_eq!(reconciler.last_value(ReadingKey::Humidity), Some(61.0));
    }

    #[test]
    fn readings_without_sensor_time_use_and_advance_the_clock() {
        let mut reconciler = reconciler();

        let first = reconciler.merge(&batch(&[(ReadingKey::WindDeg, 90.0, None)]));
        assert_eq!(readings(&first), vec![(ReadingKey::WindDeg, Some(90.0), start())]);
        assert_eq!(clock_events(&first), vec![start().timestamp() + 1]);

        let second = reconciler.merge(&batch(&[
            (ReadingKey::WindGust, 2.0, None),
            (ReadingKey::WindSpeed, 1.3, None),
        ]));
        let stamped = start() + Duration::seconds(1);
        assert_eq!(readings(&second), vec![
            (ReadingKey::WindGust, Some(2.0), stamped),
            (ReadingKey::WindSpeed, Some(1.3), stamped),
        ]);
        assert_eq!(clock_events(&second), vec![start().timestamp() + 2]);
        assert_eq!(reconciler.observation_clock(), Some(start() + Duration::seconds(2)));
    }

    #[test]
    fn older_sensor_time_never_moves_the_clock_back() {
        let mut reconciler = reconciler();
        let late = start() + Duration::hours(1);

        reconciler.merge(&batch(&[(ReadingKey::Temperature, 20.0, Some(late))]));
        let events = reconciler.merge(&batch(&[(ReadingKey::Pressure, 1000.0, Some(start()))]));

        assert!(clock_events(&events).is_empty());
        assert_eq!(reconciler.observation_clock(), Some(late));
    }

    #[test]
    fn clock_is_monotonic_across_mixed_batches() {
        let mut reconciler = reconciler();
        let mut last = i64::MIN;

        for step in 0..20i64 {
            let sensor_time = start() + Duration::seconds(step * 7 % 11);
            let events = reconciler.merge(&batch(&[
                (ReadingKey::Temperature, step as f64, Some(sensor_time)),
                (ReadingKey::Rain1h, 0.0, None),
            ]));
            for epoch in clock_events(&events) {
                assert!(epoch > last, "clock went from {last} to {epoch}");
                last = epoch;
            }
        }
    }

    #[test]
    fn reset_forgets_values_and_clock() {
        let mut reconciler = reconciler();
        reconciler.merge(&batch(&[(ReadingKey::Rain24h, 1.2, None)]));

        reconciler.reset();
        assert_eq!(reconciler.observation_clock(), None);
        assert_eq!(reconciler.last_value(ReadingKey::Rain24h), None);
    }

    #[test]
    fn events_serialize_with_a_kind_tag() {
        let event = OutboundEvent::Clock { epoch_seconds: 42 };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "clock", "epochSeconds": 42 }));
    }
}
