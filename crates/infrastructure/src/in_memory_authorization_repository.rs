use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use warden_application::{
    AssignmentFilter, AssignmentKey, AssignmentPatch, AssignmentState, AssignmentUpdate,
    PrincipalRepository, RoleAssignmentRepository, RoleFilter, RoleRepository,
};
use warden_core::{AppError, AppResult, PrincipalId};
use warden_domain::{
    AssignmentId, LegacyPermissionMap, LegacyRole, Principal, Role, RoleAssignment, RoleId,
    RoleModule,
};

/// In-memory principal, role and assignment store.
///
/// Mirrors the database constraints: one role slug per scope and one assignment row per
/// (principal, role, tenant).
#[derive(Debug, Default)]
pub struct InMemoryAuthorizationRepository {
    principals: RwLock<HashMap<PrincipalId, Principal>>,
    roles: RwLock<HashMap<RoleId, Role>>,
    assignments: RwLock<HashMap<AssignmentKey, RoleAssignment>>,
}

impl InMemoryAuthorizationRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or replaces a principal record.
    pub async fn save_principal(&self, principal: Principal) {
        self.principals
            .write()
            .await
            .insert(principal.id(), principal);
    }

    /// Seeds one global system role per legacy tag, carrying that tag's fallback keys.
    pub async fn seed_system_roles(&self) -> AppResult<Vec<Role>> {
        let mut seeded = Vec::with_capacity(LegacyRole::all().len());
        for legacy_role in LegacyRole::all() {
            let permissions = LegacyPermissionMap::fallback_for(*legacy_role);
            let keys = if permissions.is_wildcard() {
                vec![warden_domain::PermissionKey::wildcard()]
            } else {
                permissions.keys().cloned().collect()
            };

            let name = capitalize(legacy_role.as_str());
            let role = Role::system(RoleId::new(), name, RoleModule::Platform, keys)?;
            seeded.push(self.insert_role(role).await?);
        }

        Ok(seeded)
    }
}

fn capitalize(value: &str) -> String {
    let mut characters = value.chars();
    match characters.next() {
        Some(first) => first.to_uppercase().chain(characters).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl PrincipalRepository for InMemoryAuthorizationRepository {
    async fn find_principal(&self, principal_id: PrincipalId) -> AppResult<Option<Principal>> {
        Ok(self.principals.read().await.get(&principal_id).cloned())
    }
}

#[async_trait]
impl RoleRepository for InMemoryAuthorizationRepository {
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.roles.read().await.get(&role_id).cloned())
    }

    async fn list_roles(&self, filter: RoleFilter) -> AppResult<Vec<Role>> {
        let roles = self.roles.read().await;

        let mut values: Vec<Role> = roles
            .values()
            .filter(|role| filter.include_inactive || role.is_active())
            .filter(|role| {
                filter
                    .role_ids
                    .as_ref()
                    .is_none_or(|role_ids| role_ids.contains(&role.id()))
            })
            .filter(|role| {
                filter
                    .available_to
                    .is_none_or(|tenant_id| role.is_available_to(tenant_id))
            })
            .filter(|role| filter.slug.as_deref().is_none_or(|slug| role.slug() == slug))
            .cloned()
            .collect();

        values.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(values)
    }

    async fn insert_role(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.write().await;

        if roles.contains_key(&role.id()) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.id()
            )));
        }

        if roles
            .values()
            .any(|existing| existing.tenant_id() == role.tenant_id() && existing.slug() == role.slug())
        {
            return Err(AppError::Conflict(format!(
                "role slug '{}' already exists",
                role.slug()
            )));
        }

        roles.insert(role.id(), role.clone());
        Ok(role)
    }

    async fn save_role(&self, role: Role) -> AppResult<Role> {
        let mut roles = self.roles.write().await;
        let Some(existing) = roles.get_mut(&role.id()) else {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                role.id()
            )));
        };

        *existing = role.clone();
        Ok(role)
    }
}

#[async_trait]
impl RoleAssignmentRepository for InMemoryAuthorizationRepository {
    async fn find_assignments(&self, filter: AssignmentFilter) -> AppResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.read().await;

        Ok(assignments
            .values()
            .filter(|assignment| {
                filter
                    .principal_id
                    .is_none_or(|principal_id| assignment.principal_id == principal_id)
            })
            .filter(|assignment| {
                filter
                    .role_id
                    .is_none_or(|role_id| assignment.role_id == role_id)
            })
            .filter(|assignment| {
                filter
                    .tenant_id
                    .is_none_or(|tenant_id| assignment.tenant_id == tenant_id)
            })
            .filter(|assignment| match filter.state {
                AssignmentState::Any => true,
                AssignmentState::Active => assignment.is_active,
                AssignmentState::EffectiveAt(now) => assignment.is_effective_at(now),
            })
            .cloned()
            .collect())
    }

    async fn upsert_assignment(
        &self,
        key: AssignmentKey,
        patch: AssignmentPatch,
    ) -> AppResult<RoleAssignment> {
        let mut assignments = self.assignments.write().await;
        let assignment = assignments.entry(key).or_insert_with(|| RoleAssignment {
            id: AssignmentId::new(),
            principal_id: key.principal_id,
            role_id: key.role_id,
            tenant_id: key.tenant_id,
            is_active: true,
            expires_at: None,
            additional_grants: Vec::new(),
            revocations: Vec::new(),
            granted_by: patch.granted_by,
            scope: None,
        });

        assignment.is_active = true;
        assignment.expires_at = patch.expires_at;
        assignment.additional_grants = patch.additional_grants;
        assignment.revocations = patch.revocations;
        assignment.granted_by = patch.granted_by;
        assignment.scope = patch.scope;

        Ok(assignment.clone())
    }

    async fn update_assignment(
        &self,
        assignment_id: AssignmentId,
        update: AssignmentUpdate,
    ) -> AppResult<()> {
        let mut assignments = self.assignments.write().await;
        let Some(assignment) = assignments
            .values_mut()
            .find(|assignment| assignment.id == assignment_id)
        else {
            return Err(AppError::NotFound(format!(
                "role assignment '{assignment_id}' was not found"
            )));
        };

        if let Some(is_active) = update.is_active {
            assignment.is_active = is_active;
        }

        Ok(())
    }
}
