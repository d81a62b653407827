use std::sync::Arc;

use tracing::warn;

use pillow_core::{AppError, AppResult};
use pillow_domain::{AuditEventId, AuditLogRecord};

use crate::{AuditLogPage, AuditLogQuery, AuditLogRepository};

/// Application service for reading persisted audit rows.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditLogService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Lists one page of audit rows, newest first.
    ///
    /// A failing count degrades to a zero total instead of failing the page.
    pub async fn list_audit_log(&self, query: AuditLogQuery) -> AppResult<AuditLogPage> {
        let records = self
            .repository
            .list_recent(query.limit, query.offset())
            .await?;

        let total = match self.repository.count().await {
            Ok(total) => total,
            Err(error) => {
                warn!(error = %error, "failed to count audit log rows");
                0
            }
        };

        Ok(AuditLogPage {
            records,
            page: query.page,
            limit: query.limit,
            total,
            total_pages: total.div_ceil(u64::from(query.limit.max(1))),
        })
    }

    /// Returns one audit row.
    pub async fn get_audit_log(&self, id: AuditEventId) -> AppResult<AuditLogRecord> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("audit log entry '{id}' not found")))
    }
}
