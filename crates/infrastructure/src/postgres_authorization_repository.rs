use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use warden_application::{
    AssignmentFilter, AssignmentKey, AssignmentPatch, AssignmentUpdate, PrincipalRepository,
    RoleAssignmentRepository, RoleFilter, RoleRepository,
};
use warden_core::{AppError, AppResult, PrincipalId, TenantId};
use warden_domain::{
    AssignmentId, LegacyRole, PermissionKey, Principal, Role, RoleAssignment, RoleId, RoleModule,
};

mod assignments;
mod principals;
mod roles;


/// PostgreSQL-backed principal, role and assignment store.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: Uuid,
    tenant_id: Uuid,
    display_name: String,
    legacy_role: String,
    direct_permissions: Vec<String>,
    is_active: bool,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = AppError;

    fn try_from(row: PrincipalRow) -> AppResult<Self> {
        let legacy_role = LegacyRole::from_str(row.legacy_role.as_str())
            .map_err(|error| stored_value_error("principal", row.id, error))?;
        let direct_permissions = PermissionKey::parse_all(&row.direct_permissions)
            .map_err(|error| stored_value_error("principal", row.id, error))?;

        Ok(Principal::new(
            PrincipalId::from_uuid(row.id),
            TenantId::from_uuid(row.tenant_id),
            row.display_name,
            legacy_role,
        )
        .map_err(|error| stored_value_error("principal", row.id, error))?
        .with_direct_permissions(direct_permissions)
        .with_active(row.is_active))
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    slug: String,
    module: String,
    permissions: Vec<String>,
    is_system: bool,
    tenant_id: Option<Uuid>,
    is_active: bool,
}

impl TryFrom<RoleRow> for Role {
    type Error = AppError;

    fn try_from(row: RoleRow) -> AppResult<Self> {
        let module = RoleModule::from_str(row.module.as_str())
            .map_err(|error| stored_value_error("role", row.id, error))?;
        let permissions = PermissionKey::parse_all(&row.permissions)
            .map_err(|error| stored_value_error("role", row.id, error))?;
        let role_id = RoleId::from_uuid(row.id);

        let role = match (row.is_system, row.tenant_id) {
            (true, None) => Role::system(role_id, row.name, module, permissions),
            (false, Some(tenant_id)) => Role::custom(
                role_id,
                TenantId::from_uuid(tenant_id),
                row.name,
                module,
                permissions,
            ),
            _ => Err(AppError::Validation(
                "system roles must be global and custom roles tenant-scoped".to_owned(),
            )),
        }
        .and_then(|role| role.with_slug(row.slug))
        .map_err(|error| stored_value_error("role", row.id, error))?;

        Ok(role.with_active(row.is_active))
    }
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    id: Uuid,
    principal_id: Uuid,
    role_id: Uuid,
    tenant_id: Uuid,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    additional_grants: Vec<String>,
    revocations: Vec<String>,
    granted_by: Uuid,
    scope: Option<String>,
}

impl TryFrom<AssignmentRow> for RoleAssignment {
    type Error = AppError;

    fn try_from(row: AssignmentRow) -> AppResult<Self> {
        let additional_grants = PermissionKey::parse_all(&row.additional_grants)
            .map_err(|error| stored_value_error("role assignment", row.id, error))?;
        let revocations = PermissionKey::parse_all(&row.revocations)
            .map_err(|error| stored_value_error("role assignment", row.id, error))?;

        Ok(RoleAssignment {
            id: AssignmentId::from_uuid(row.id),
            principal_id: PrincipalId::from_uuid(row.principal_id),
            role_id: RoleId::from_uuid(row.role_id),
            tenant_id: TenantId::from_uuid(row.tenant_id),
            is_active: row.is_active,
            expires_at: row.expires_at,
            additional_grants,
            revocations,
            granted_by: PrincipalId::from_uuid(row.granted_by),
            scope: row.scope,
        })
    }
}

fn stored_value_error(kind: &str, id: Uuid, error: AppError) -> AppError {
    AppError::Internal(format!("failed to decode stored {kind} '{id}': {error}"))
}

fn key_strings(keys: &[PermissionKey]) -> Vec<String> {
    keys.iter().map(|key| key.as_str().to_owned()).collect()
}

#[async_trait]
impl PrincipalRepository for PostgresAuthorizationRepository {
    async fn find_principal(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        self.find_principal_impl(principal_id).await
    }
}

#[async_trait]
impl RoleRepository for PostgresAuthorizationRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        self.find_role_impl(role_id).await
    }

    async fn list_roles(&self, filter: RoleFilter) -> AppResult<Vec<Role>> {
        self.list_roles_impl(filter).await
    }

    async fn insert_role(&self, role: Role) -> AppResult<Role> {
        self.insert_role_impl(role).await
    }

    async fn save_role(&self, role: Role) -> AppResult<Role> {
        self.save_role_impl(role).await
    }
}

#[async_trait]
impl RoleAssignmentRepository for PostgresAuthorizationRepository {
    async fn find_assignments(&self, filter: AssignmentFilter) -> AppResult<Vec<RoleAssignment>> {
        self.find_assignments_impl(filter).await
    }

    async fn upsert_assignment(
        &self,
        key: AssignmentKey,
        patch: AssignmentPatch,
    ) -> AppResult<RoleAssignment> {
        self.upsert_assignment_impl(key, patch).await
    }

    async fn update_assignment(
        &self,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> AppResult<()> {
        self.update_assignment_impl(assignment_id, update).await
    }
}
