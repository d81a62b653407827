use async_trait::async_trait;
use sqlx::PgPool;

use pillow_application::AuditStore;
use pillow_core::{AppError, AppResult};
use pillow_domain::AuditLogRecord;

/// PostgreSQL-backed append-only audit store.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PostgresAuditRepository {
    async fn insert_record(&self, record: AuditLogRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (id, user_id, action, details, timestamp)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.map(|user_id| user_id.as_uuid()))
        .bind(record.action.as_str())
        .bind(record.details.as_str())
        .bind(record.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to insert audit log (action={}): {error}",
                record.action
            ))
        })?;

        Ok(())
    }
}
