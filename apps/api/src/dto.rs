mod audit_logs;
mod health;
mod roles;

pub use audit_logs::{AuditLogEntryResponse, AuditLogListResponse, PaginationResponse};
pub use health::{AuditPipelineHealthResponse, HealthDependencyStatus, HealthResponse};
pub use roles::{CreateRoleRequest, RoleResponse, UpdateRoleRequest};
