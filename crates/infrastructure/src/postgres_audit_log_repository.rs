use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use pillow_application::AuditLogRepository;
use pillow_core::{AppError, AppResult, UserId};
use pillow_domain::{AuditEventId, AuditLogRecord};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed repository for audit log reads.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    id: Uuid,
    user_id: Option<Uuid>,
    action: String,
    details: String,
    timestamp: DateTime<Utc>,
}

impl From<AuditLogRow> for AuditLogRecord {
    fn from(row: AuditLogRow) -> Self {
        Self {
            id: AuditEventId::from_uuid(row.id),
            user_id: row.user_id.map(UserId::from_uuid),
            action: row.action,
            details: row.details,
            timestamp: row.timestamp,
        }
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_recent(&self, limit: u32, offset: u64) -> AppResult<Vec<AuditLogRecord>> {
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, user_id, action, details, timestamp
            FROM audit_log
            ORDER BY timestamp DESC, id
            LIMIT $1
            OFFSET $2
            "#,
        )
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit logs: {error}")))?;

        Ok(rows.into_iter().map(AuditLogRecord::from).collect())
    }

    async fn count(&self) -> AppResult<u64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to count audit logs: {error}"))
            })?;

        Ok(u64::try_from(total).unwrap_or_default())
    }

    async fn find_by_id(&self, id: AuditEventId) -> AppResult<Option<AuditLogRecord>> {
        let row = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT id, user_id, action, details, timestamp
            FROM audit_log
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to query audit log: {error}")))?;

        Ok(row.map(AuditLogRecord::from))
    }
}
