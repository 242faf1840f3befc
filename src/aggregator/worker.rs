use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::readings::{ReadingBatch, ReadingStore};
use crate::sampling::WindowSnapshot;

use super::reducers::Reducer;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// One per sampler: snapshots are reduced in arrival order, so a key's
/// updates reach the store and the batch channel in acquisition order.
pub(crate) async fn reduction_loop<R: Reducer>(
    reducer: R,
    mut snapshots: mpsc::Receiver<WindowSnapshot<R::Sample>>,
    store: ReadingStore,
    batches: mpsc::UnboundedSender<ReadingBatch>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("reducer {} shutting down", reducer.name());
                break;
            }
            received = snapshots.recv() => {
                let Some(snapshot) = received else {
                    log_debug!("reducer {}: sampler gone", reducer.name());
                    break;
                };

                let updates = reducer.reduce(&snapshot);
                if updates.is_empty() {
                    continue;
                }

                let batch = store.apply(&updates);
                if batches.send(batch).is_err() {
                    log_warn!("reducer {}: reconciler gone, stopping", reducer.name());
                    break;
                }
            }
        }
    }
}
