use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};

use crate::readings::ReadingBatch;

use super::state::{OutboundEvent, Reconciler};

const ENABLE_LOGS: bool = true;

use crate::log_info;

/// Receives merged events, in order, one call per batch.
pub trait DownstreamListener: Send + Sync {
    fn publish(&self, events: &[OutboundEvent]);
}

/// Single consumer of every aggregator batch. Returns the reconciler once
/// all senders are gone.
pub fn spawn_reconciler(
    mut batches: mpsc::UnboundedReceiver<ReadingBatch>,
    mut reconciler: Reconciler,
    listener: Arc<dyn DownstreamListener>,
) -> JoinHandle<Reconciler> {
    tokio::spawn(async move {
        while let Some(batch) = batches.recv().await {
            let events = reconciler.merge(&batch);
            if !events.is_empty() {
                listener.publish(&events);
            }
        }
        log_info!("reconciler drained, stopping");
        reconciler
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};

    use crate::clock::ManualClock;
    use crate::readings::{ReadingKey, SensorReading};

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Vec<OutboundEvent>>>,
    }

    impl DownstreamListener for Recorder {
        fn publish(&self, events: &[OutboundEvent]) {
            self.calls.lock().unwrap().push(events.to_vec());
        }
    }

    #[tokio::test]
    async fn forwards_each_batch_in_order() {
        let start = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let recorder = Arc::new(Recorder::default());
        let handle = spawn_reconciler(
            rx,
            Reconciler::new(Arc::new(ManualClock::new(start))),
            recorder.clone(),
        );

        for value in [1.0, 2.0, 3.0] {
            let mut batch = ReadingBatch::new();
            batch.insert(
                ReadingKey::WindSpeed,
                SensorReading::with_value(Some(value), "m/s", None, start),
            );
            tx.send(batch).unwrap();
        }
        drop(tx);

        let reconciler = handle.await.unwrap();
        assert_eq!(reconciler.last_value(ReadingKey::WindSpeed), Some(3.0));

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        let values: Vec<Option<f64>> = calls
            .iter()
            .map(|events| match &events[0] {
                OutboundEvent::Reading { value, .. } => *value,
                OutboundEvent::Clock { .. } => None,
            })
            .collect();
        assert_eq!(values, vec![Some(1.0), Some(2.0), Some(3.0)]);
        assert!(calls
            .iter()
            .all(|events| matches!(events.last(), Some(OutboundEvent::Clock { .. }))));
    }
}
