use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{Mutex, Semaphore, mpsc};

use pillow_core::{AppError, AppResult};
use pillow_domain::{AuditActionName, AuditDetails, AuditEvent, AuditLogRecord};

use super::{AuditPipeline, DeliveryOutcome};
use crate::AuditStore;

#[derive(Default)]
struct RecordingAuditStore {
    records: Mutex<Vec<AuditLogRecord>>,
}

#[async_trait]
impl AuditStore for RecordingAuditStore {
    async fn insert_record(&self, record: AuditLogRecord) -> AppResult<()> {
        self.records.lock().await.push(record);
        Ok(())
    }
}

struct UnavailableAuditStore;

#[async_trait]
impl AuditStore for UnavailableAuditStore {
    async fn insert_record(&self, _record: AuditLogRecord) -> AppResult<()> {
        Err(AppError::Internal("database unavailable".to_owned()))
    }
}

struct GatedAuditStore {
    entered: mpsc::UnboundedSender<()>,
    gate: Semaphore,
    records: Mutex<Vec<AuditLogRecord>>,
}

#[async_trait]
impl AuditStore for GatedAuditStore {
    async fn insert_record(&self, record: AuditLogRecord) -> AppResult<()> {
        let _ = self.entered.send(());
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;
        permit.forget();

        self.records.lock().await.push(record);
        Ok(())
    }
}

fn capacity(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
}

fn event(path: &str) -> AuditEvent {
    AuditEvent::new(
        None,
        AuditActionName::from_request("POST", path),
        AuditDetails::Document(json!({ "path": path })),
    )
}

#[tokio::test]
async fn record_without_running_queue_writes_inline() {
    let store = Arc::new(RecordingAuditStore::default());
    let pipeline = AuditPipeline::new(store.clone());

    assert!(!pipeline.is_running());
    assert!(!pipeline.enqueue(event("/api/roles")));
    assert_eq!(
        pipeline.record(event("/api/roles")).await,
        DeliveryOutcome::WrittenInline
    );

    assert_eq!(store.records.lock().await.len(), 1);
    assert_eq!(pipeline.status().inline_writes, 1);
}

#[tokio::test]
async fn start_is_idempotent_and_keeps_first_capacity() {
    let store = Arc::new(RecordingAuditStore::default());
    let pipeline = AuditPipeline::new(store);

    assert!(pipeline.start(capacity(8)));
    assert!(!pipeline.start(capacity(64)));

    let status = pipeline.status();
    assert!(status.running);
    assert_eq!(status.queue.map(|queue| queue.capacity), Some(8));

    pipeline.stop().await;
}

#[tokio::test]
async fn stop_drains_and_returns_to_stopped_state() {
    let store = Arc::new(RecordingAuditStore::default());
    let pipeline = AuditPipeline::new(store.clone());

    // Stopping a pipeline that never started is a no-op.
    pipeline.stop().await;

    assert!(pipeline.start(capacity(16)));
    for index in 0..5 {
        assert_eq!(
            pipeline.record(event(&format!("/api/roles/{index}"))).await,
            DeliveryOutcome::Queued
        );
    }

    pipeline.stop().await;
    assert!(!pipeline.is_running());
    assert_eq!(store.records.lock().await.len(), 5);
    assert!(!pipeline.enqueue(event("/api/roles")));

    pipeline.stop().await;
    assert!(pipeline.start(capacity(2)));
    pipeline.stop().await;
}

#[tokio::test]
async fn saturated_queue_falls_back_to_inline_write() {
    let (entered, mut entered_receiver) = mpsc::unbounded_channel();
    let store = Arc::new(GatedAuditStore {
        entered,
        gate: Semaphore::new(0),
        records: Mutex::new(Vec::new()),
    });
    let pipeline = AuditPipeline::new(store.clone());
    assert!(pipeline.start(capacity(1)));

    assert_eq!(
        pipeline.record(event("/first")).await,
        DeliveryOutcome::Queued
    );
    assert!(entered_receiver.recv().await.is_some());
    assert_eq!(
        pipeline.record(event("/second")).await,
        DeliveryOutcome::Queued
    );

    let overflow = event("/overflow");
    let overflow_id = overflow.id();
    let inline = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.record(overflow).await }
    });

    // The worker is still parked on the first event, so this signal comes
    // from the inline write of the overflow event.
    assert!(entered_receiver.recv().await.is_some());
    store.gate.add_permits(3);
    let outcome = inline.await;
    assert!(matches!(outcome, Ok(DeliveryOutcome::WrittenInline)));

    pipeline.stop().await;

    let records = store.records.lock().await;
    assert_eq!(records.len(), 3);
    assert!(records.iter().any(|record| record.id == overflow_id));
}

#[tokio::test]
async fn start_while_draining_keeps_a_single_worker() {
    let (entered, mut entered_receiver) = mpsc::unbounded_channel();
    let store = Arc::new(GatedAuditStore {
        entered,
        gate: Semaphore::new(0),
        records: Mutex::new(Vec::new()),
    });
    let pipeline = AuditPipeline::new(store.clone());
    assert!(pipeline.start(capacity(4)));

    assert_eq!(
        pipeline.record(event("/draining")).await,
        DeliveryOutcome::Queued
    );
    assert!(entered_receiver.recv().await.is_some());

    let first_stop = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.stop().await }
    });
    let second_stop = tokio::spawn({
        let pipeline = pipeline.clone();
        async move { pipeline.stop().await }
    });
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(!first_stop.is_finished());
    assert!(!second_stop.is_finished());
    assert!(!pipeline.start(capacity(4)));
    assert!(pipeline.is_running());

    store.gate.add_permits(1);
    assert!(first_stop.await.is_ok());
    assert!(second_stop.await.is_ok());
    assert!(!pipeline.is_running());
    assert_eq!(store.records.lock().await.len(), 1);

    assert!(pipeline.start(capacity(4)));
    pipeline.stop().await;
}

#[tokio::test]
async fn failed_inline_write_is_reported_as_lost() {
    let pipeline = AuditPipeline::new(Arc::new(UnavailableAuditStore));

    assert_eq!(
        pipeline.record(event("/api/roles")).await,
        DeliveryOutcome::Lost
    );
    assert_eq!(pipeline.status().lost, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_producers_never_lose_events() {
    let store = Arc::new(RecordingAuditStore::default());
    let pipeline = AuditPipeline::new(store.clone());
    assert!(pipeline.start(capacity(4)));

    let mut producers = Vec::new();
    let mut expected = HashSet::new();
    for producer in 0..8 {
        let events: Vec<AuditEvent> = (0..25)
            .map(|index| event(&format!("/producer/{producer}/{index}")))
            .collect();
        expected.extend(events.iter().map(AuditEvent::id));

        let pipeline = pipeline.clone();
        producers.push(tokio::spawn(async move {
            for event in events {
                assert_ne!(pipeline.record(event).await, DeliveryOutcome::Lost);
            }
        }));
    }

    for producer in producers {
        assert!(producer.await.is_ok());
    }
    pipeline.stop().await;

    let records = store.records.lock().await;
    let persisted: HashSet<_> = records.iter().map(|record| record.id).collect();
    assert_eq!(records.len(), 200);
    assert_eq!(persisted, expected);
}
