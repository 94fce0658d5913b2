//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_authorization_repository;
mod in_memory_permission_cache;
mod jwt_credential_service;
mod postgres_audit_repository;
mod postgres_authorization_repository;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_authorization_repository::InMemoryAuthorizationRepository;
pub use in_memory_permission_cache::InMemoryPermissionCache;
pub use jwt_credential_service::JwtCredentialService;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
