//! Bounded in-memory audit queue drained by a single background worker.
//!
//! Producers never wait: [`AuditQueue::enqueue`] either places the event in
//! the buffer or reports `false` straight away so the caller can fall back to
//! a synchronous write. [`AuditQueue::shutdown`] closes intake and waits until
//! every buffered event has been handed to the store.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{error, warn};

use pillow_core::AppResult;
use pillow_domain::{AuditEvent, DETAILS_ENCODING_FAILURE_MARKER};

use crate::AuditStore;

mod worker;


/// Bounded audit buffer with one consumer task.
pub struct AuditQueue {
    sender: RwLock<Option<mpsc::Sender<AuditEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<QueueCounters>,
    capacity: NonZeroUsize,
}

impl AuditQueue {
    /// Allocates a buffer of `capacity` events and spawns its worker.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(store: Arc<dyn AuditStore>, capacity: NonZeroUsize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.get());
        let counters = Arc::new(QueueCounters::default());
        let worker = tokio::spawn(worker::run(receiver, store, counters.clone()));

        Self {
            sender: RwLock::new(Some(sender)),
            worker: Mutex::new(Some(worker)),
            counters,
            capacity,
        }
    }

    /// Offers an event without blocking.
    ///
    /// Returns `false` when the buffer is full or the queue has been shut down.
    pub fn enqueue(&self, event: AuditEvent) -> bool {
        self.try_enqueue(event).is_ok()
    }

    /// Offers an event, handing it back when it was not accepted.
    pub(crate) fn try_enqueue(&self, event: AuditEvent) -> Result<(), AuditEvent> {
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            return Err(event);
        };

        match sender.try_send(event) {
            Ok(()) => {
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(event)) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                Err(event)
            }
            Err(TrySendError::Closed(event)) => {
                self.counters.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(event_id = %event.id(), "audit worker is gone; rejecting event");
                Err(event)
            }
        }
    }

    /// Stops intake and waits until the worker has drained the buffer.
    ///
    /// Concurrent callers all return once the drain has finished. Calling it
    /// again after completion returns immediately.
    pub async fn shutdown(&self) {
        let sender = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        // Dropping the last sender lets the worker finish once the buffer is empty.
        drop(sender);

        // The lock is held across the join so later callers wait for the drain.
        let mut worker = self.worker.lock().await;
        if let Some(handle) = worker.take()
            && let Err(join_error) = handle.await
        {
            error!(error = %join_error, "audit worker terminated abnormally");
        }
    }

    /// Returns the configured buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> NonZeroUsize {
        self.capacity
    }

    /// Returns counters and current buffer occupancy.
    #[must_use]
    pub fn snapshot(&self) -> AuditQueueSnapshot {
        let guard = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let buffered = guard
            .as_ref()
            .map(|sender| self.capacity.get().saturating_sub(sender.capacity()))
            .unwrap_or_default();

        AuditQueueSnapshot {
            capacity: self.capacity.get(),
            buffered,
            accepting: guard.is_some(),
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            rejected: self.counters.rejected.load(Ordering::Relaxed),
            persisted: self.counters.persisted.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of queue activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditQueueSnapshot {
    /// Buffer capacity.
    pub capacity: usize,
    /// Events waiting in the buffer.
    pub buffered: usize,
    /// Whether the queue still accepts events.
    pub accepting: bool,
    /// Events accepted into the buffer.
    pub accepted: u64,
    /// Events turned away because of backpressure or shutdown.
    pub rejected: u64,
    /// Events written by the worker.
    pub persisted: u64,
    /// Events whose write failed in the worker.
    pub failed: u64,
}

#[derive(Debug, Default)]
struct QueueCounters {
    accepted: AtomicU64,
    rejected: AtomicU64,
    persisted: AtomicU64,
    failed: AtomicU64,
}

/// Encodes event details and inserts the resulting row.
///
/// Used by the worker and by the inline fallback path alike.
pub(crate) async fn persist_event(store: &dyn AuditStore, event: AuditEvent) -> AppResult<()> {
    let details = match event.details().try_encode() {
        Ok(details) => details,
        Err(encode_error) => {
            warn!(
                event_id = %event.id(),
                action = %event.action(),
                error = %encode_error,
                "audit details could not be encoded, storing marker"
            );
            DETAILS_ENCODING_FAILURE_MARKER.to_owned()
        }
    };

    store.insert_record(event.into_record(details)).await
}
