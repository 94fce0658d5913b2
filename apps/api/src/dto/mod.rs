mod common;
mod security;

pub use common::{HealthDependencyStatus, HealthResponse, MeResponse};
pub use security::{
    AssignRoleRequest, CloneRoleRequest, CreateRoleRequest, RevokeRoleRequest,
    RoleAssignmentResponse, RoleResponse, UpdateRoleRequest,
};
