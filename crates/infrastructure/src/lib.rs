//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_role_repository;
mod jwt_access_token_verifier;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_role_repository;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_role_repository::InMemoryRoleRepository;
pub use jwt_access_token_verifier::{
    ACCESS_TOKEN_ISSUER, AccessTokenClaims, JwtAccessTokenVerifier,
};
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_role_repository::PostgresRoleRepository;
