use async_trait::async_trait;

use pillow_core::AppResult;
use pillow_domain::{AuditEventId, AuditLogRecord};

/// Port for persisting audit rows.
///
/// Shared by the queue worker and by request tasks taking the synchronous
/// fallback path, so implementations must tolerate concurrent calls.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Inserts one audit row.
    async fn insert_record(&self, record: AuditLogRecord) -> AppResult<()>;
}

/// Repository port for reading persisted audit rows.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists rows newest first.
    async fn list_recent(&self, limit: u32, offset: u64) -> AppResult<Vec<AuditLogRecord>>;

    /// Counts all rows.
    async fn count(&self) -> AppResult<u64>;

    /// Finds one row by identifier.
    async fn find_by_id(&self, id: AuditEventId) -> AppResult<Option<AuditLogRecord>>;
}

/// Pagination request for audit log listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl AuditLogQuery {
    /// Page size used when the caller sends none or an out-of-range value.
    pub const DEFAULT_LIMIT: u32 = 50;

    /// Largest accepted page size.
    pub const MAX_LIMIT: u32 = 100;

    /// Builds a query from raw request values.
    ///
    /// Non-positive pages fall back to the first page. Limits outside
    /// `1..=MAX_LIMIT` fall back to [`Self::DEFAULT_LIMIT`].
    #[must_use]
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page
            .filter(|page| *page > 0)
            .and_then(|page| u32::try_from(page).ok())
            .unwrap_or(1);
        let limit = limit
            .filter(|limit| (1..=i64::from(Self::MAX_LIMIT)).contains(limit))
            .and_then(|limit| u32::try_from(limit).ok())
            .unwrap_or(Self::DEFAULT_LIMIT);

        Self { page, limit }
    }

    /// Returns the number of rows to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl Default for AuditLogQuery {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of audit rows with pagination totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogPage {
    /// Rows on this page, newest first.
    pub records: Vec<AuditLogRecord>,
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Total rows across all pages.
    pub total: u64,
    /// Number of pages for `total` rows.
    pub total_pages: u64,
}
