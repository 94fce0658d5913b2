use serde::Serialize;
use ts_rs::TS;
use warden_application::AuthContext;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub postgres: HealthDependencyStatus,
}

/// One runtime dependency health status.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

/// Authenticated principal with its resolved permissions.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/me-response.ts"
)]
pub struct MeResponse {
    pub principal_id: String,
    pub tenant_id: String,
    pub display_name: String,
    pub legacy_role: String,
    pub is_superuser: bool,
    /// Sorted permission keys, or `["*"]` for the wildcard.
    pub permissions: Vec<String>,
}

impl From<&AuthContext> for MeResponse {
    fn from(context: &AuthContext) -> Self {
        let principal = context.principal();
        Self {
            principal_id: principal.id().to_string(),
            tenant_id: principal.tenant_id().to_string(),
            display_name: principal.display_name().to_owned(),
            legacy_role: principal.legacy_role().as_str().to_owned(),
            is_superuser: context.is_superuser(),
            permissions: context.permissions().to_claim_list(),
        }
    }
}
