use std::sync::Arc;

use tracing::info;
use warden_core::{AppError, AppResult};
use warden_domain::{AuditAction, PermissionKey, Role, RoleId, RoleModule, catalog};

use crate::{
    AuditEvent, AuditRepository, AuditTrail, AuthContext, AuthorizationGate, PermissionCache,
    RoleFilter, RoleRepository,
};

/// Input payload for custom role creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Display name; the slug is derived from it.
    pub name: String,
    /// Functional module tag.
    pub module: RoleModule,
    /// Granted permission keys.
    pub permissions: Vec<PermissionKey>,
}

/// Partial role update. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateRoleInput {
    /// New display name.
    pub name: Option<String>,
    /// New functional module.
    pub module: Option<RoleModule>,
    /// Replacement permission list.
    pub permissions: Option<Vec<PermissionKey>>,
}

/// Input payload for role cloning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRoleInput {
    /// Name of the copy.
    pub name: String,
}

/// Maintains role definitions.
///
/// Permission-list changes clear the whole permission cache since holders are not tracked
/// per role.
#[derive(Clone)]
pub struct RoleService {
    role_repository: Arc<dyn RoleRepository>,
    cache: Arc<dyn PermissionCache>,
    gate: AuthorizationGate,
    audit_trail: AuditTrail,
}

impl RoleService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        role_repository: Arc<dyn RoleRepository>,
        cache: Arc<dyn PermissionCache>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            role_repository,
            cache,
            gate: AuthorizationGate::new(audit_repository.clone()),
            audit_trail: AuditTrail::new(audit_repository),
        }
    }

    /// Lists global roles plus the actor tenant's custom roles.
    pub async fn list_roles(&self, actor: &AuthContext) -> AppResult<Vec<Role>> {
        self.gate
            .guard(actor, catalog::SECURITY_ROLES_MANAGE, || {
                self.role_repository.list_roles(RoleFilter {
                    available_to: Some(actor.tenant_id()),
                    ..RoleFilter::default()
                })
            })
            .await
    }

    /// Creates a custom role owned by the actor's tenant.
    pub async fn create_role(&self, actor: &AuthContext, input: CreateRoleInput) -> AppResult<Role> {
        self.gate
            .require(actor, catalog::SECURITY_ROLES_MANAGE)
            .await?;
        self.ensure_grantable(actor, &input.permissions)?;

        let role = Role::custom(
            RoleId::new(),
            actor.tenant_id(),
            input.name,
            input.module,
            input.permissions,
        )?;
        self.ensure_slug_free(actor, role.slug()).await?;

        let role = self.role_repository.insert_role(role).await?;
        info!(role_id = %role.id(), slug = role.slug(), "custom role created");

        self.record(actor, AuditAction::SecurityRoleCreated, &role, "created")
            .await;
        Ok(role)
    }

    /// Updates metadata and permissions of a role.
    pub async fn update_role(
        &self,
        actor: &AuthContext,
        role_id: RoleId,
        input: UpdateRoleInput,
    ) -> AppResult<Role> {
        self.gate
            .require(actor, catalog::SECURITY_ROLES_MANAGE)
            .await?;
        let mut role = self.load_active_role(role_id).await?;
        self.ensure_mutable(actor, &role).await?;

        if let Some(name) = input.name {
            role.rename(name)?;
        }
        if let Some(module) = input.module {
            role.set_module(module);
        }
        let permissions_changed = match input.permissions {
            Some(permissions) => {
                self.ensure_grantable(actor, &permissions)?;
                role.replace_permissions(permissions)
            }
            None => false,
        };

        let role = self.role_repository.save_role(role).await?;
        if permissions_changed {
            self.cache.invalidate_all().await;
            info!(role_id = %role.id(), "role permissions changed; permission cache cleared");
        }

        self.record(actor, AuditAction::SecurityRoleUpdated, &role, "updated")
            .await;
        Ok(role)
    }

    /// Soft-deletes a custom role. System roles cannot be deleted.
    pub async fn delete_role(&self, actor: &AuthContext, role_id: RoleId) -> AppResult<()> {
        self.gate
            .require(actor, catalog::SECURITY_ROLES_MANAGE)
            .await?;
        let mut role = self.load_active_role(role_id).await?;

        if role.is_system() {
            return Err(self
                .deny_scope(actor, &role, format!("system role '{}' cannot be deleted", role.slug()))
                .await);
        }
        self.ensure_mutable(actor, &role).await?;

        role.deactivate();
        let role = self.role_repository.save_role(role).await?;
        self.cache.invalidate_all().await;
        info!(role_id = %role.id(), "role deleted; permission cache cleared");

        self.record(actor, AuditAction::SecurityRoleDeleted, &role, "deleted")
            .await;
        Ok(())
    }

    /// Copies a visible role into a new custom role of the actor's tenant.
    pub async fn clone_role(
        &self,
        actor: &AuthContext,
        role_id: RoleId,
        input: CloneRoleInput,
    ) -> AppResult<Role> {
        self.gate
            .require(actor, catalog::SECURITY_ROLES_MANAGE)
            .await?;
        let source = self.load_active_role(role_id).await?;

        if !source.is_available_to(actor.tenant_id()) {
            return Err(self
                .deny_scope(
                    actor,
                    &source,
                    format!("role '{}' belongs to another tenant", source.slug()),
                )
                .await);
        }
        self.ensure_grantable(actor, source.permissions())?;

        let role = source.clone_into_tenant(RoleId::new(), actor.tenant_id(), input.name)?;
        self.ensure_slug_free(actor, role.slug()).await?;

        let role = self.role_repository.insert_role(role).await?;
        info!(source_role_id = %source.id(), role_id = %role.id(), "role cloned");

        self.record(actor, AuditAction::SecurityRoleCloned, &role, "cloned")
            .await;
        Ok(role)
    }

    async fn load_active_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.role_repository
            .find_role(role_id)
            .await?
            .filter(Role::is_active)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    async fn ensure_mutable(&self, actor: &AuthContext, role: &Role) -> AppResult<()> {
        let message = if role.is_system() && !actor.is_superuser() {
            format!("system role '{}' is editable by superusers only", role.slug())
        } else if role
            .tenant_id()
            .is_some_and(|owner| owner != actor.tenant_id())
        {
            format!("role '{}' belongs to another tenant", role.slug())
        } else {
            return Ok(());
        };

        Err(self.deny_scope(actor, role, message).await)
    }

    fn ensure_grantable(&self, actor: &AuthContext, permissions: &[PermissionKey]) -> AppResult<()> {
        if actor.is_superuser() || !permissions.iter().any(PermissionKey::is_wildcard) {
            return Ok(());
        }

        Err(AppError::EscalationDenied(
            "only a superuser may define roles carrying the wildcard permission".to_owned(),
        ))
    }

    async fn ensure_slug_free(&self, actor: &AuthContext, slug: &str) -> AppResult<()> {
        let existing = self
            .role_repository
            .list_roles(RoleFilter {
                available_to: Some(actor.tenant_id()),
                slug: Some(slug.to_owned()),
                include_inactive: true,
                ..RoleFilter::default()
            })
            .await?;

        if existing.is_empty() {
            return Ok(());
        }

        Err(AppError::Conflict(format!(
            "a role with slug '{slug}' already exists"
        )))
    }

    async fn deny_scope(&self, actor: &AuthContext, role: &Role, message: String) -> AppError {
        self.audit_trail
            .record(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::SecurityTenantScopeDenied,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id().to_string(),
                detail: Some(message.clone()),
            })
            .await;

        AppError::CrossTenantViolation(message)
    }

    async fn record(&self, actor: &AuthContext, action: AuditAction, role: &Role, verb: &str) {
        self.audit_trail
            .record(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id().to_string(),
                detail: Some(format!("{verb} role '{}'", role.slug())),
            })
            .await;
    }
}
