//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod role;

pub use audit::{
    AUDIT_ACTION_MAX_LENGTH, AuditActionName, AuditDetails, AuditEvent, AuditEventId,
    AuditLogRecord, CapturedBody, DETAILS_ENCODING_FAILURE_MARKER, DetailsPayload,
    RequestEnvelope, UploadMetadata,
};
pub use role::{ROLE_NAME_MAX_LENGTH, Role, RoleChange, RoleId};
