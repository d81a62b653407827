//! Audit event model.
//!
//! An [`AuditEvent`] is built once by a producer (usually the HTTP audit
//! middleware) and never mutated afterwards. Its details payload stays in
//! structured form until the moment of persistence, where it is encoded to
//! JSON text and flattened into an [`AuditLogRecord`].

use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pillow_core::{AppError, AppResult, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::role::RoleChange;

/// Maximum number of characters stored in the `action` column.
pub const AUDIT_ACTION_MAX_LENGTH: usize = 255;

/// Details text persisted when a payload cannot be encoded.
pub const DETAILS_ENCODING_FAILURE_MARKER: &str = "\"audit:marshal_error\"";

/// Unique identifier of an audit event, assigned when the event is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditEventId(Uuid);

impl AuditEventId {
    /// Creates a random event identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AuditEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AuditEventId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Short machine-readable tag naming an audited action, e.g. `ROLE_UPDATED`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AuditActionName(String);

impl AuditActionName {
    /// Creates a validated action name.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "audit action must not be empty".to_owned(),
            ));
        }

        if trimmed.chars().count() > AUDIT_ACTION_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "audit action must not exceed {AUDIT_ACTION_MAX_LENGTH} characters"
            )));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Derives the generic `"<METHOD> <path>"` action used when a handler
    /// supplies no explicit name.
    ///
    /// Over-long paths are cut on a character boundary so the result always
    /// satisfies the length limit.
    #[must_use]
    pub fn from_request(method: &str, path: &str) -> Self {
        let method = method.trim().to_uppercase();
        let method = if method.is_empty() {
            "UNKNOWN".to_owned()
        } else {
            method.chars().take(AUDIT_ACTION_MAX_LENGTH / 2).collect()
        };

        let path = path.trim();
        let path = if path.is_empty() { "/" } else { path };
        let budget = AUDIT_ACTION_MAX_LENGTH - method.chars().count() - 1;
        let path: String = path.chars().take(budget).collect();

        Self(format!("{method} {}", path.trim_end()))
    }

    /// Returns the action name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for AuditActionName {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoleChange> for AuditActionName {
    fn from(change: RoleChange) -> Self {
        Self(change.action().to_owned())
    }
}

impl From<AuditActionName> for String {
    fn from(value: AuditActionName) -> Self {
        value.0
    }
}

impl Display for AuditActionName {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Caller-defined payload that knows how to encode itself as JSON.
///
/// Every `Serialize + Debug + Send + Sync` type implements this trait, so
/// handlers can hand any serializable snapshot to [`AuditDetails::custom`].
pub trait DetailsPayload: Debug + Send + Sync {
    /// Encodes the payload as JSON text.
    fn to_json(&self) -> Result<String, serde_json::Error>;
}

impl<T> DetailsPayload for T
where
    T: Serialize + Debug + Send + Sync,
{
    fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Metadata recorded in place of a file upload body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadMetadata {
    /// Request content type, including the multipart boundary parameter.
    pub content_type: String,
    /// Declared or observed body size.
    pub size_bytes: Option<u64>,
    /// File names announced by the multipart parts.
    pub file_names: Vec<String>,
    /// Human-readable reason for omitting the content.
    pub note: String,
}

/// Request body as captured for the generic details envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CapturedBody {
    /// Body parsed as JSON.
    Json {
        /// Parsed document.
        value: Value,
    },
    /// Non-JSON body decoded as (lossy) UTF-8 text.
    Text {
        /// Decoded text.
        value: String,
    },
    /// File upload replaced by metadata.
    Upload(UploadMetadata),
    /// Body not captured.
    Omitted {
        /// Why the body was skipped.
        reason: String,
        /// Declared size when known.
        size_bytes: Option<u64>,
    },
}

/// Generic details built by the audit middleware when a handler supplied none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// HTTP method of the audited request.
    pub method: String,
    /// Request path without query string.
    pub path: String,
    /// Authenticated actor, if any.
    pub actor_id: Option<UserId>,
    /// Peer address as seen by the server.
    pub remote_addr: Option<String>,
    /// Captured request body, if any.
    pub body: Option<CapturedBody>,
}

/// Structured payload describing what an audited action did.
#[derive(Debug, Clone)]
pub enum AuditDetails {
    /// Before/after snapshot of a changed resource.
    Change {
        /// State before the action.
        before: Option<Value>,
        /// State after the action.
        after: Option<Value>,
        /// Additional action context.
        context: Option<Value>,
    },
    /// Generic request envelope.
    Request(RequestEnvelope),
    /// Arbitrary JSON document.
    Document(Value),
    /// Opaque payload encoded only at persistence time.
    Custom(Arc<dyn DetailsPayload>),
}

impl AuditDetails {
    /// Wraps an arbitrary serializable payload.
    #[must_use]
    pub fn custom(payload: impl DetailsPayload + 'static) -> Self {
        Self::Custom(Arc::new(payload))
    }

    /// Encodes the payload as JSON text.
    pub fn try_encode(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Change {
                before,
                after,
                context,
            } => serde_json::to_string(&json!({
                "before": before,
                "after": after,
                "context": context,
            })),
            Self::Request(envelope) => serde_json::to_string(&json!({
                "before": Value::Null,
                "after": Value::Null,
                "context": envelope,
            })),
            Self::Document(value) => serde_json::to_string(value),
            Self::Custom(payload) => payload.to_json(),
        }
    }

    /// Encodes the payload, substituting [`DETAILS_ENCODING_FAILURE_MARKER`]
    /// when encoding fails.
    #[must_use]
    pub fn encode(&self) -> String {
        self.try_encode()
            .unwrap_or_else(|_| DETAILS_ENCODING_FAILURE_MARKER.to_owned())
    }
}

/// Immutable record of one audited action.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    id: AuditEventId,
    actor_id: Option<UserId>,
    action: AuditActionName,
    details: AuditDetails,
    timestamp: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an event stamped with a fresh identifier and the current time.
    #[must_use]
    pub fn new(actor_id: Option<UserId>, action: AuditActionName, details: AuditDetails) -> Self {
        Self {
            id: AuditEventId::new(),
            actor_id,
            action,
            details,
            timestamp: Utc::now(),
        }
    }

    /// Returns the event identifier.
    #[must_use]
    pub fn id(&self) -> AuditEventId {
        self.id
    }

    /// Returns the actor, absent for anonymous or system events.
    #[must_use]
    pub fn actor_id(&self) -> Option<UserId> {
        self.actor_id
    }

    /// Returns the action name.
    #[must_use]
    pub fn action(&self) -> &AuditActionName {
        &self.action
    }

    /// Returns the structured details.
    #[must_use]
    pub fn details(&self) -> &AuditDetails {
        &self.details
    }

    /// Returns the creation time.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Flattens the event into its persisted shape using already-encoded details.
    #[must_use]
    pub fn into_record(self, details: String) -> AuditLogRecord {
        AuditLogRecord {
            id: self.id,
            user_id: self.actor_id,
            action: self.action.into(),
            details,
            timestamp: self.timestamp,
        }
    }
}

/// Audit row as stored and read back from persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogRecord {
    /// Event identifier.
    pub id: AuditEventId,
    /// Actor identifier, if any.
    pub user_id: Option<UserId>,
    /// Action name.
    pub action: String,
    /// JSON-encoded details.
    pub details: String,
    /// Event creation time.
    pub timestamp: DateTime<Utc>,
}
