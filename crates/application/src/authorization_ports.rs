use async_trait::async_trait;
use chrono::{DateTime, Utc};
use warden_core::{AppResult, PrincipalId, TenantId};
use warden_domain::{AssignmentId, PermissionKey, Principal, Role, RoleAssignment, RoleId};

/// Repository port for principal records.
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Finds a principal by identifier.
    async fn find_principal(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>>;
}

/// Filter for role listings. Empty fields do not restrict the result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleFilter {
    /// Restricts the result to these identifiers.
    pub role_ids: Option<Vec<RoleId>>,
    /// Restricts the result to global roles plus roles owned by this tenant.
    pub available_to: Option<TenantId>,
    /// Restricts the result to one slug.
    pub slug: Option<String>,
    /// Includes soft-deleted roles.
    pub include_inactive: bool,
}

/// Repository port for role definitions.
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Finds a role by identifier, including soft-deleted ones.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists roles matching the filter, ordered by name.
    async fn list_roles(&self, filter: RoleFilter) -> AppResult<Vec<Role>>;

    /// Persists a new role. Fails with `Conflict` when the slug is taken in its scope.
    async fn insert_role(&self, role: Role) -> AppResult<Role>;

    /// Persists changes to an existing role. Fails with `NotFound` when it does not exist.
    async fn save_role(&self, role: Role) -> AppResult<Role>;
}

/// Lifecycle filter for assignment listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentState {
    /// Active and inactive rows.
    Any,
    /// Rows whose active flag is set, regardless of expiry.
    Active,
    /// Active rows that have not expired at the instant.
    EffectiveAt(DateTime<Utc>),
}

/// Filter for assignment listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentFilter {
    /// Restricts the result to one principal.
    pub principal_id: Option<PrincipalId>,
    /// Restricts the result to one role.
    pub role_id: Option<RoleId>,
    /// Restricts the result to one tenant.
    pub tenant_id: Option<TenantId>,
    /// Lifecycle restriction.
    pub state: AssignmentState,
}

impl AssignmentFilter {
    /// Assignments that count for a principal in a tenant at `now`.
    #[must_use]
    pub fn effective_for(principal_id: PrincipalId, tenant_id: TenantId, now: DateTime<Utc>) -> Self {
        Self {
            principal_id: Some(principal_id),
            role_id: None,
            tenant_id: Some(tenant_id),
            state: AssignmentState::EffectiveAt(now),
        }
    }
}

/// Natural key of an assignment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssignmentKey {
    /// Principal holding the role.
    pub principal_id: PrincipalId,
    /// Granted role.
    pub role_id: RoleId,
    /// Tenant scope.
    pub tenant_id: TenantId,
}

/// Values written by an upsert. The row is always left active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentPatch {
    /// Optional expiry instant.
    pub expires_at: Option<DateTime<Utc>>,
    /// Extra keys granted by the binding.
    pub additional_grants: Vec<PermissionKey>,
    /// Keys removed from the binding's contribution.
    pub revocations: Vec<PermissionKey>,
    /// Granting actor.
    pub granted_by: PrincipalId,
    /// Optional branch or scope qualifier.
    pub scope: Option<String>,
}

/// Partial update of an existing assignment row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentUpdate {
    /// New active flag.
    pub is_active: Option<bool>,
}

/// Repository port for role assignments.
#[async_trait]
pub trait RoleAssignmentRepository: Send + Sync {
    /// Lists assignments matching the filter.
    async fn find_assignments(&self, filter: AssignmentFilter) -> AppResult<Vec<RoleAssignment>>;

    /// Inserts or reactivates the row for `key` in one atomic write.
    ///
    /// Concurrent calls for the same key must never produce two rows.
    async fn upsert_assignment(
        &self,
        key: AssignmentKey,
        patch: AssignmentPatch,
    ) -> AppResult<RoleAssignment>;

    /// Applies a partial update. Fails with `NotFound` when the row does not exist.
    async fn update_assignment(
        &self,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> AppResult<()>;
}
