//! Audit trail for successful state-changing requests.
//!
//! Handlers describe what they did by returning an [`AuditHint`] in their
//! response. Older handlers may instead set the `X-Audit-Action` and
//! `X-Audit-Details` response headers. When neither is present the event is
//! named after the request line and carries a [`RequestEnvelope`].

mod capture;


use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::{IntoResponseParts, Response, ResponseParts};
use pillow_core::Principal;
use pillow_domain::{AuditActionName, AuditDetails, AuditEvent, RequestEnvelope};
use serde_json::Value;
use tracing::{debug, warn};

use super::is_state_changing_method;
use crate::state::AppState;

use self::capture::capture_body;

/// Legacy response header naming the audit action.
pub const AUDIT_ACTION_HEADER: HeaderName = HeaderName::from_static("x-audit-action");

/// Legacy response header carrying JSON audit details.
pub const AUDIT_DETAILS_HEADER: HeaderName = HeaderName::from_static("x-audit-details");

/// Action name and details a handler attaches to its response.
///
/// Returned as part of a response tuple, for example
/// `(StatusCode::CREATED, hint, Json(body))`. The middleware removes it from
/// the response before it is sent.
#[derive(Debug, Clone)]
pub struct AuditHint {
    action: AuditActionName,
    details: Option<AuditDetails>,
}

impl AuditHint {
    /// Creates a hint that overrides the derived action name.
    #[must_use]
    pub fn new(action: AuditActionName) -> Self {
        Self {
            action,
            details: None,
        }
    }

    /// Also overrides the generic request envelope.
    #[must_use]
    pub fn with_details(mut self, details: AuditDetails) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponseParts for AuditHint {
    type Error = Infallible;

    fn into_response_parts(self, mut response: ResponseParts) -> Result<ResponseParts, Self::Error> {
        response.extensions_mut().insert(self);
        Ok(response)
    }
}

#[derive(Debug, Default)]
struct LegacyHint {
    action: Option<AuditActionName>,
    details: Option<AuditDetails>,
}

/// Emits at most one audit event per successful mutating request.
///
/// Expects [`super::require_auth`] to run first when an actor is required;
/// anonymous requests are audited with no actor.
pub async fn audit_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_state_changing_method(request.method()) {
        return next.run(request).await;
    }

    let actor_id = request
        .extensions()
        .get::<Principal>()
        .map(Principal::user_id);
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(address)| address.to_string());
    let method = request.method().as_str().to_owned();
    let path = request.uri().path().to_owned();

    let (parts, body) = request.into_parts();
    let (body, captured_body) =
        capture_body(&parts.headers, body, state.audit_body_capture_limit).await;

    let mut response = next.run(Request::from_parts(parts, body)).await;
    let hint = response.extensions_mut().remove::<AuditHint>();
    let legacy = take_legacy_hint(response.headers_mut());

    if !response.status().is_success() {
        return response;
    }

    match actor_id {
        Some(actor_id) => debug!(%actor_id, %method, %path, "audit actor detected"),
        None => debug!(%method, %path, "no audit actor detected"),
    }

    let (hinted_action, hinted_details) = match hint {
        Some(hint) => (Some(hint.action), hint.details),
        None => (None, None),
    };
    let action = hinted_action
        .or(legacy.action)
        .unwrap_or_else(|| AuditActionName::from_request(&method, &path));
    let details = hinted_details.or(legacy.details).unwrap_or_else(|| {
        AuditDetails::Request(RequestEnvelope {
            method,
            path,
            actor_id,
            remote_addr,
            body: captured_body,
        })
    });

    state
        .audit_pipeline
        .record(AuditEvent::new(actor_id, action, details))
        .await;

    response
}

/// Removes the legacy headers so they never reach the client.
fn take_legacy_hint(headers: &mut HeaderMap) -> LegacyHint {
    let action = headers
        .remove(AUDIT_ACTION_HEADER)
        .and_then(|value| value.to_str().ok().map(str::to_owned))
        .filter(|value| !value.trim().is_empty())
        .and_then(|value| match AuditActionName::new(value) {
            Ok(action) => Some(action),
            Err(error) => {
                warn!(%error, "ignoring invalid audit action header");
                None
            }
        });

    let details = headers
        .remove(AUDIT_DETAILS_HEADER)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .filter(|value| !value.trim().is_empty())
        .map(|raw| {
            let document = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
            AuditDetails::Document(document)
        });

    LegacyHint { action, details }
}
