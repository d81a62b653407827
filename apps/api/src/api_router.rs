mod cors;


use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use pillow_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

use self::cors::build_cors_layer;

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let cors_layer = build_cors_layer(frontend_url)?;

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes(app_state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state))
}

/// Authenticated API routes. Successful mutations are audited.
fn protected_routes(app_state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/roles",
            get(handlers::roles::list_roles_handler).post(handlers::roles::create_role_handler),
        )
        .route(
            "/api/roles/{role_id}",
            get(handlers::roles::get_role_handler)
                .put(handlers::roles::update_role_handler)
                .delete(handlers::roles::delete_role_handler),
        )
        .route(
            "/api/audit-logs",
            get(handlers::audit_logs::list_audit_logs_handler),
        )
        .route(
            "/api/audit-logs/{audit_log_id}",
            get(handlers::audit_logs::get_audit_log_handler),
        )
        // Layers added later run first, so authentication precedes auditing.
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::audit_mutations,
        ))
        .route_layer(from_fn_with_state(app_state, middleware::require_auth))
}
