use async_trait::async_trait;
use tokio::sync::RwLock;

use pillow_application::{AuditLogRepository, AuditStore};
use pillow_core::{AppError, AppResult};
use pillow_domain::{AuditEventId, AuditLogRecord};

/// In-memory audit store and read repository.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    records: RwLock<Vec<AuditLogRecord>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Returns every stored row in insertion order.
    pub async fn records(&self) -> Vec<AuditLogRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditRepository {
    async fn insert_record(&self, record: AuditLogRecord) -> AppResult<()> {
        let mut records = self.records.write().await;
        if records.iter().any(|existing| existing.id == record.id) {
            return Err(AppError::Conflict(format!(
                "audit log entry '{}' already exists",
                record.id
            )));
        }

        records.push(record);
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditRepository {
    async fn list_recent(&self, limit: u32, offset: u64) -> AppResult<Vec<AuditLogRecord>> {
        let mut records = self.records.read().await.clone();
        records.sort_by(|left, right| right.timestamp.cmp(&left.timestamp));

        Ok(records
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self) -> AppResult<u64> {
        let len = self.records.read().await.len();
        Ok(u64::try_from(len).unwrap_or(u64::MAX))
    }

    async fn find_by_id(&self, id: AuditEventId) -> AppResult<Option<AuditLogRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| record.id == id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use pillow_application::{AuditLogRepository, AuditStore};
    use pillow_domain::{AuditEventId, AuditLogRecord};

    use super::InMemoryAuditRepository;

    fn record(action: &str, offset_seconds: i64) -> AuditLogRecord {
        AuditLogRecord {
            id: AuditEventId::new(),
            user_id: None,
            action: action.to_owned(),
            details: "{}".to_owned(),
            timestamp: Utc::now() + Duration::seconds(offset_seconds),
        }
    }

    #[tokio::test]
    async fn listing_pages_newest_first() {
        let repository = InMemoryAuditRepository::new();
        for (index, action) in ["A", "B", "C"].into_iter().enumerate() {
            let offset = i64::try_from(index).unwrap_or_default();
            assert!(repository.insert_record(record(action, offset)).await.is_ok());
        }

        let first_page = repository.list_recent(2, 0).await.unwrap_or_default();
        let second_page = repository.list_recent(2, 2).await.unwrap_or_default();

        let first: Vec<&str> = first_page.iter().map(|record| record.action.as_str()).collect();
        let second: Vec<&str> = second_page.iter().map(|record| record.action.as_str()).collect();
        assert_eq!(first, vec!["C", "B"]);
        assert_eq!(second, vec!["A"]);
        assert!(matches!(repository.count().await, Ok(3)));
    }

    #[tokio::test]
    async fn identifiers_are_never_reused() {
        let repository = InMemoryAuditRepository::new();
        let entry = record("ONCE", 0);

        assert!(repository.insert_record(entry.clone()).await.is_ok());
        assert!(repository.insert_record(entry).await.is_err());
        assert_eq!(repository.records().await.len(), 1);
    }
}
