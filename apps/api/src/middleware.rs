mod audit;
mod auth;

pub use audit::{AuditHint, audit_mutations};
pub use auth::require_auth;

use axum::http::Method;

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
