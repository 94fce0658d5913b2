//! Domain entities and invariants of the authorization engine.

#![forbid(unsafe_code)]

mod assignment;
mod legacy;
mod permission;
mod principal;
mod role;
mod security;

pub use assignment::{AssignmentId, RoleAssignment};
pub use legacy::{LegacyPermissionMap, LegacyRole};
pub use permission::{PermissionKey, PermissionSet, WILDCARD_PERMISSION, catalog};
pub use principal::Principal;
pub use role::{Role, RoleId, RoleModule, SUPERUSER_ROLE_SLUG};
pub use security::AuditAction;
