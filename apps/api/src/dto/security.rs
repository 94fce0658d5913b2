mod conversions;
mod types;

pub use types::{
    AssignRoleRequest, CloneRoleRequest, CreateRoleRequest, RevokeRoleRequest,
    RoleAssignmentResponse, RoleResponse, UpdateRoleRequest,
};
