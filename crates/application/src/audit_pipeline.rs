//! Process-wide audit pipeline handle.
//!
//! The handle is cloned into the application state so the startup routine and
//! the HTTP middleware share one queue. It owns the store so that the inline
//! fallback keeps working while the queue is not running.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{error, info, warn};

use pillow_domain::AuditEvent;

use crate::audit_queue::persist_event;
use crate::{AuditQueue, AuditQueueSnapshot, AuditStore};

#[cfg(test)]
mod tests;

/// How an audit event reached (or failed to reach) storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Accepted by the queue; the worker will persist it.
    Queued,
    /// Queue unavailable or full; written synchronously by the caller.
    WrittenInline,
    /// Queue unavailable or full and the inline write failed.
    Lost,
}

/// Status reported by [`AuditPipeline::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditPipelineStatus {
    /// Whether a queue is currently running.
    pub running: bool,
    /// Queue counters, when running.
    pub queue: Option<AuditQueueSnapshot>,
    /// Events written through the inline fallback.
    pub inline_writes: u64,
    /// Events whose inline fallback write failed.
    pub lost: u64,
}

/// Shared handle with idempotent start/stop around a single [`AuditQueue`].
#[derive(Clone)]
pub struct AuditPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    store: Arc<dyn AuditStore>,
    queue: RwLock<Option<Arc<AuditQueue>>>,
    inline_writes: AtomicU64,
    lost: AtomicU64,
}

impl AuditPipeline {
    /// Creates a stopped pipeline bound to a store.
    #[must_use]
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                store,
                queue: RwLock::new(None),
                inline_writes: AtomicU64::new(0),
                lost: AtomicU64::new(0),
            }),
        }
    }

    /// Starts the queue if none is running.
    ///
    /// Returns `false` when a queue was already active; the running queue
    /// keeps its original capacity.
    pub fn start(&self, capacity: NonZeroUsize) -> bool {
        let mut queue = self
            .inner
            .queue
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if queue.is_some() {
            return false;
        }

        *queue = Some(Arc::new(AuditQueue::new(
            self.inner.store.clone(),
            capacity,
        )));
        info!(capacity = capacity.get(), "audit queue started");
        true
    }

    /// Shuts the running queue down, draining it, and returns the handle to
    /// the stopped state. Does nothing when no queue is running.
    ///
    /// The queue stays installed while it drains, so a concurrent
    /// [`start`](Self::start) cannot spawn a second worker and concurrent
    /// callers all wait for the drain to finish.
    pub async fn stop(&self) {
        let Some(queue) = self.current_queue() else {
            return;
        };

        queue.shutdown().await;

        let removed = {
            let mut slot = self
                .inner
                .queue
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let is_same = slot
                .as_ref()
                .is_some_and(|current| Arc::ptr_eq(current, &queue));
            if is_same {
                slot.take();
            }
            is_same
        };

        if removed {
            let snapshot = queue.snapshot();
            info!(
                persisted = snapshot.persisted,
                failed = snapshot.failed,
                rejected = snapshot.rejected,
                "audit queue stopped"
            );
        }
    }

    /// Returns whether a queue is installed, including one that is draining.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.current_queue().is_some()
    }

    /// Offers an event to the running queue without blocking.
    ///
    /// Returns `false` when no queue is running or the buffer is full.
    pub fn enqueue(&self, event: AuditEvent) -> bool {
        self.try_enqueue(event).is_ok()
    }

    /// Delivers an event through the queue, falling back to a synchronous
    /// insert when the queue cannot take it.
    ///
    /// Never fails: an inline write error is logged and reported as
    /// [`DeliveryOutcome::Lost`].
    pub async fn record(&self, event: AuditEvent) -> DeliveryOutcome {
        let event = match self.try_enqueue(event) {
            Ok(()) => return DeliveryOutcome::Queued,
            Err(event) => event,
        };

        let event_id = event.id();
        let action = event.action().to_string();
        warn!(
            event_id = %event_id,
            action = %action,
            "audit queue unavailable or full, writing audit event inline"
        );

        match persist_event(self.inner.store.as_ref(), event).await {
            Ok(()) => {
                self.inner.inline_writes.fetch_add(1, Ordering::Relaxed);
                DeliveryOutcome::WrittenInline
            }
            Err(persist_error) => {
                self.inner.lost.fetch_add(1, Ordering::Relaxed);
                error!(
                    event_id = %event_id,
                    action = %action,
                    error = %persist_error,
                    "inline audit write failed, event dropped"
                );
                DeliveryOutcome::Lost
            }
        }
    }

    /// Returns the current pipeline status.
    #[must_use]
    pub fn status(&self) -> AuditPipelineStatus {
        let queue = self.current_queue();
        AuditPipelineStatus {
            running: queue.is_some(),
            queue: queue.map(|queue| queue.snapshot()),
            inline_writes: self.inner.inline_writes.load(Ordering::Relaxed),
            lost: self.inner.lost.load(Ordering::Relaxed),
        }
    }

    fn try_enqueue(&self, event: AuditEvent) -> Result<(), AuditEvent> {
        match self.current_queue() {
            Some(queue) => queue.try_enqueue(event),
            None => Err(event),
        }
    }

    fn current_queue(&self) -> Option<Arc<AuditQueue>> {
        self.inner
            .queue
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
