//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_log_service;
mod audit_pipeline;
mod audit_ports;
mod audit_queue;
mod auth_ports;
mod role_service;

pub use audit_log_service::AuditLogService;
pub use audit_pipeline::{AuditPipeline, AuditPipelineStatus, DeliveryOutcome};
pub use audit_ports::{AuditLogPage, AuditLogQuery, AuditLogRepository, AuditStore};
pub use audit_queue::{AuditQueue, AuditQueueSnapshot};
pub use auth_ports::AccessTokenVerifier;
pub use role_service::{
    CreateRoleInput, RoleChange, RoleRepository, RoleService, UpdateRoleInput,
};
