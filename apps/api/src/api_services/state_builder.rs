use std::sync::Arc;

use pillow_application::{AuditLogService, AuditPipeline, RoleService};
use pillow_infrastructure::{
    JwtAccessTokenVerifier, PostgresAuditLogRepository, PostgresAuditRepository,
    PostgresRoleRepository,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Wires the PostgreSQL adapters into the application services.
///
/// The audit pipeline is returned stopped; `main` starts it once the
/// listener is ready.
pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> AppState {
    let audit_store = Arc::new(PostgresAuditRepository::new(pool.clone()));
    let audit_log_repository = Arc::new(PostgresAuditLogRepository::new(pool.clone()));
    let role_repository = Arc::new(PostgresRoleRepository::new(pool.clone()));

    AppState {
        audit_pipeline: AuditPipeline::new(audit_store),
        audit_log_service: AuditLogService::new(audit_log_repository),
        role_service: RoleService::new(role_repository),
        token_verifier: Arc::new(JwtAccessTokenVerifier::new(&config.jwt_secret)),
        postgres_pool: pool,
        audit_body_capture_limit: config.audit_body_capture_limit,
    }
}
