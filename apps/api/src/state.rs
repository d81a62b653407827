use std::sync::Arc;

use pillow_application::{AccessTokenVerifier, AuditLogService, AuditPipeline, RoleService};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub audit_pipeline: AuditPipeline,
    pub audit_log_service: AuditLogService,
    pub role_service: RoleService,
    pub token_verifier: Arc<dyn AccessTokenVerifier>,
    pub postgres_pool: PgPool,
    pub audit_body_capture_limit: usize,
}
