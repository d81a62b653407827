use pillow_application::AuditLogPage;
use pillow_domain::AuditLogRecord;
use serde::Serialize;
use serde_json::Value;
use ts_rs::TS;

/// API representation of a persisted audit row.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub id: String,
    pub user_id: Option<String>,
    pub action: String,
    /// Stored details decoded as JSON, or the raw text when not valid JSON.
    #[ts(type = "unknown")]
    pub details: Value,
    pub timestamp: String,
}

/// Page metadata for audit log listings.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/pagination-response.ts"
)]
pub struct PaginationResponse {
    pub page: u32,
    pub limit: u32,
    #[ts(type = "number")]
    pub total: u64,
    #[ts(type = "number")]
    pub total_pages: u64,
}

/// One page of audit log entries, newest first.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-log-list-response.ts"
)]
pub struct AuditLogListResponse {
    pub audit_logs: Vec<AuditLogEntryResponse>,
    pub pagination: PaginationResponse,
}

impl From<AuditLogRecord> for AuditLogEntryResponse {
    fn from(value: AuditLogRecord) -> Self {
        let details =
            serde_json::from_str::<Value>(&value.details).unwrap_or(Value::String(value.details));

        Self {
            id: value.id.to_string(),
            user_id: value.user_id.map(|user_id| user_id.to_string()),
            action: value.action,
            details,
            timestamp: value.timestamp.to_rfc3339(),
        }
    }
}

impl From<AuditLogPage> for AuditLogListResponse {
    fn from(value: AuditLogPage) -> Self {
        Self {
            audit_logs: value
                .records
                .into_iter()
                .map(AuditLogEntryResponse::from)
                .collect(),
            pagination: PaginationResponse {
                page: value.page,
                limit: value.limit,
                total: value.total,
                total_pages: value.total_pages,
            },
        }
    }
}
