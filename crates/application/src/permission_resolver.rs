//! Effective permission resolution.
//!
//! Merges a principal's effective role assignments, their per-assignment grants and
//! revocations, and the principal's direct overrides. Principals without any effective
//! assignment fall back to the legacy role table.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;
use warden_core::{AppError, AppResult, PrincipalId, TenantId};
use warden_domain::{LegacyPermissionMap, PermissionSet, Principal, RoleId};

use crate::{
    AssignmentFilter, CacheGeneration, PermissionCache, PrincipalRepository,
    RoleAssignmentRepository, RoleFilter, RoleRepository,
};

/// Computes effective permission sets, reading through the permission cache.
#[derive(Clone)]
pub struct PermissionResolver {
    principal_repository: Arc<dyn PrincipalRepository>,
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn RoleAssignmentRepository>,
    cache: Arc<dyn PermissionCache>,
}

impl PermissionResolver {
    /// Creates a resolver from its stores and the process cache.
    #[must_use]
    pub fn new(
        principal_repository: Arc<dyn PrincipalRepository>,
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn RoleAssignmentRepository>,
        cache: Arc<dyn PermissionCache>,
    ) -> Self {
        Self {
            principal_repository,
            role_repository,
            assignment_repository,
            cache,
        }
    }

    /// Resolves the permission set of a principal within a tenant.
    ///
    /// A result computed from store state older than the principal's last invalidation is
    /// returned to this caller but never cached.
    pub async fn resolve(
        &self,
        principal_id: PrincipalId,
        tenant_id: TenantId,
    ) -> AppResult<PermissionSet> {
        if let Some(permissions) = self.cache.get(principal_id).await {
            return Ok(permissions);
        }
        let generation = self.cache.generation(principal_id).await;

        let principal = self
            .principal_repository
            .find_principal(principal_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("principal '{principal_id}' was not found")))?;

        let permissions = self.compute(&principal, tenant_id).await?;
        self.store(principal_id, generation, &permissions).await;

        Ok(permissions)
    }

    /// Resolves the permission set of an already loaded principal in its own tenant.
    pub async fn resolve_principal(&self, principal: &Principal) -> AppResult<PermissionSet> {
        if let Some(permissions) = self.cache.get(principal.id()).await {
            return Ok(permissions);
        }
        let generation = self.cache.generation(principal.id()).await;

        let permissions = self.compute(principal, principal.tenant_id()).await?;
        self.store(principal.id(), generation, &permissions).await;

        Ok(permissions)
    }

    /// Computes the permission set without reading or writing the cache.
    pub async fn resolve_fresh(&self, principal: &Principal) -> AppResult<PermissionSet> {
        self.compute(principal, principal.tenant_id()).await
    }

    async fn store(
        &self,
        principal_id: PrincipalId,
        generation: CacheGeneration,
        permissions: &PermissionSet,
    ) {
        if !self
            .cache
            .put_if_current(principal_id, generation, permissions.clone())
            .await
        {
            debug!(%principal_id, "discarding permission set computed before an invalidation");
        }
    }

    async fn compute(&self, principal: &Principal, tenant_id: TenantId) -> AppResult<PermissionSet> {
        if principal.is_superuser() {
            return Ok(PermissionSet::wildcard());
        }

        let now = Utc::now();
        let assignments: Vec<_> = self
            .assignment_repository
            .find_assignments(AssignmentFilter::effective_for(principal.id(), tenant_id, now))
            .await?
            .into_iter()
            .filter(|assignment| assignment.is_effective_at(now))
            .collect();

        let mut permissions = if assignments.is_empty() {
            LegacyPermissionMap::fallback_for(principal.legacy_role())
        } else {
            let role_ids: Vec<RoleId> = assignments.iter().map(|assignment| assignment.role_id).collect();
            let roles: HashMap<RoleId, _> = self
                .role_repository
                .list_roles(RoleFilter {
                    role_ids: Some(role_ids),
                    ..RoleFilter::default()
                })
                .await?
                .into_iter()
                .filter(|role| role.is_active() && role.is_available_to(tenant_id))
                .map(|role| (role.id(), role))
                .collect();

            let mut merged = PermissionSet::empty();
            for assignment in &assignments {
                let Some(role) = roles.get(&assignment.role_id) else {
                    debug!(
                        assignment_id = %assignment.id,
                        role_id = %assignment.role_id,
                        "skipping assignment with unresolved role"
                    );
                    continue;
                };

                merged.union_with(&assignment.contribution(role.permissions()));
            }
            merged
        };

        permissions.extend(principal.direct_permissions().iter().cloned());
        Ok(permissions)
    }
}
