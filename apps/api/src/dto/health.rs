use pillow_application::AuditPipelineStatus;
use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
    pub audit_pipeline: AuditPipelineHealthResponse,
}

/// Status of one runtime dependency.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// Audit pipeline counters. Queue fields are absent while the queue is stopped.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/audit-pipeline-health-response.ts"
)]
pub struct AuditPipelineHealthResponse {
    pub running: bool,
    #[ts(type = "number | null")]
    pub capacity: Option<usize>,
    #[ts(type = "number | null")]
    pub buffered: Option<usize>,
    #[ts(type = "number | null")]
    pub accepted: Option<u64>,
    #[ts(type = "number | null")]
    pub rejected: Option<u64>,
    #[ts(type = "number | null")]
    pub persisted: Option<u64>,
    #[ts(type = "number | null")]
    pub failed: Option<u64>,
    #[ts(type = "number")]
    pub inline_writes: u64,
    #[ts(type = "number")]
    pub lost: u64,
}

impl From<AuditPipelineStatus> for AuditPipelineHealthResponse {
    fn from(value: AuditPipelineStatus) -> Self {
        let queue = value.queue;
        Self {
            running: value.running,
            capacity: queue.map(|queue| queue.capacity),
            buffered: queue.map(|queue| queue.buffered),
            accepted: queue.map(|queue| queue.accepted),
            rejected: queue.map(|queue| queue.rejected),
            persisted: queue.map(|queue| queue.persisted),
            failed: queue.map(|queue| queue.failed),
            inline_writes: value.inline_writes,
            lost: value.lost,
        }
    }
}
