use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use warden_application::{AuthContext, CloneRoleInput, CreateRoleInput, UpdateRoleInput};
use warden_core::PrincipalId;
use warden_domain::RoleId;

use crate::dto::{
    AssignRoleRequest, CloneRoleRequest, CreateRoleRequest, RevokeRoleRequest,
    RoleAssignmentResponse, RoleResponse, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

mod assignments;
mod roles;

pub use assignments::{
    assign_role_handler, list_principal_assignments_handler, revoke_role_handler,
};
pub use roles::{
    clone_role_handler, create_role_handler, delete_role_handler, list_roles_handler,
    update_role_handler,
};
