use std::sync::Arc;
use std::sync::atomic::Ordering;

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use pillow_domain::AuditEvent;

use super::{QueueCounters, persist_event};
use crate::AuditStore;

/// Drains the buffer until every sender is gone and the buffer is empty.
///
/// Delivery is at most once: a failed insert is logged and the loop moves on.
pub(super) async fn run(
    mut receiver: mpsc::Receiver<AuditEvent>,
    store: Arc<dyn AuditStore>,
    counters: Arc<QueueCounters>,
) {
    while let Some(event) = receiver.recv().await {
        let event_id = event.id();
        let action = event.action().to_string();

        match persist_event(store.as_ref(), event).await {
            Ok(()) => {
                counters.persisted.fetch_add(1, Ordering::Relaxed);
                debug!(event_id = %event_id, action = %action, "audit event persisted");
            }
            Err(persist_error) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                error!(
                    event_id = %event_id,
                    action = %action,
                    error = %persist_error,
                    "failed to insert audit log"
                );
            }
        }
    }

    info!("audit worker drained and stopped");
}
