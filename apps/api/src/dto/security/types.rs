use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    pub module: String,
    pub permissions: Vec<String>,
}

/// Incoming payload for role edits. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-role-request.ts"
)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

/// Incoming payload for role cloning.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/clone-role-request.ts"
)]
pub struct CloneRoleRequest {
    pub name: String,
}

/// Incoming payload for role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    pub principal_id: String,
    pub role_id: String,
    /// Defaults to the caller's tenant.
    #[serde(default)]
    pub tenant_id: Option<String>,
    /// RFC 3339 timestamp.
    #[serde(default)]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub additional_grants: Vec<String>,
    #[serde(default)]
    pub revocations: Vec<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Incoming payload for role revocation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/revoke-role-request.ts"
)]
pub struct RevokeRoleRequest {
    pub principal_id: String,
    pub role_id: String,
    #[serde(default)]
    pub tenant_id: Option<String>,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub name: String,
    pub slug: String,
    pub module: String,
    pub permissions: Vec<String>,
    pub is_system: bool,
    pub tenant_id: Option<String>,
    pub is_active: bool,
}

/// API representation of a role assignment.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-assignment-response.ts"
)]
pub struct RoleAssignmentResponse {
    pub assignment_id: String,
    pub principal_id: String,
    pub role_id: String,
    pub tenant_id: String,
    pub is_active: bool,
    pub expires_at: Option<String>,
    pub additional_grants: Vec<String>,
    pub revocations: Vec<String>,
    pub granted_by: String,
    pub scope: Option<String>,
}
