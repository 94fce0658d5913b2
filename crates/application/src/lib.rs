//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod auth_context;
mod authorization_gate;
mod authorization_ports;
mod credential_ports;
mod permission_cache;
mod permission_resolver;
mod request_authenticator;
mod role_assignment_service;
mod role_service;

#[cfg(test)]
mod test_fakes;

pub use audit_ports::{AuditEvent, AuditRepository, AuditTrail};
pub use auth_context::AuthContext;
pub use authorization_gate::{AuthorizationGate, MatchMode, has, has_all, has_any};
pub use authorization_ports::{
    AssignmentFilter, AssignmentKey, AssignmentPatch, AssignmentState, AssignmentUpdate,
    PrincipalRepository, RoleAssignmentRepository, RoleFilter, RoleRepository,
};
pub use credential_ports::{
    CredentialIssuer, CredentialRequest, CredentialVerifier, IssuedCredential, VerifiedCredential,
};
pub use permission_cache::{CacheGeneration, DEFAULT_PERMISSION_CACHE_TTL, PermissionCache};
pub use permission_resolver::PermissionResolver;
pub use request_authenticator::RequestAuthenticator;
pub use role_assignment_service::{AssignRoleInput, RevokeRoleInput, RoleAssignmentService};
pub use role_service::{CloneRoleInput, CreateRoleInput, RoleService, UpdateRoleInput};
