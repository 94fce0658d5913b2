use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use warden_core::{AppError, AppResult, PrincipalId, TenantId};
use warden_domain::{AuditAction, PermissionKey, Role, RoleAssignment, RoleId, catalog};

use crate::{
    AssignmentFilter, AssignmentKey, AssignmentPatch, AssignmentState, AssignmentUpdate,
    AuditEvent, AuditRepository, AuditTrail, AuthContext, AuthorizationGate, PermissionCache,
    PrincipalRepository, RoleAssignmentRepository, RoleRepository,
};

/// Input payload for granting a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignRoleInput {
    /// Principal receiving the role.
    pub principal_id: PrincipalId,
    /// Granted role.
    pub role_id: RoleId,
    /// Tenant scope of the binding.
    pub tenant_id: TenantId,
    /// Optional expiry; must lie in the future.
    pub expires_at: Option<DateTime<Utc>>,
    /// Extra keys granted by this binding only.
    pub additional_grants: Vec<PermissionKey>,
    /// Keys removed from this binding's contribution.
    pub revocations: Vec<PermissionKey>,
    /// Optional branch or scope qualifier.
    pub scope: Option<String>,
}

/// Input payload for revoking a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevokeRoleInput {
    /// Principal holding the role.
    pub principal_id: PrincipalId,
    /// Revoked role.
    pub role_id: RoleId,
    /// Tenant scope of the binding.
    pub tenant_id: TenantId,
}

/// Grants and revokes roles, keeping the permission cache in step.
#[derive(Clone)]
pub struct RoleAssignmentService {
    principal_repository: Arc<dyn PrincipalRepository>,
    role_repository: Arc<dyn RoleRepository>,
    assignment_repository: Arc<dyn RoleAssignmentRepository>,
    cache: Arc<dyn PermissionCache>,
    gate: AuthorizationGate,
    audit_trail: AuditTrail,
}

impl RoleAssignmentService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        principal_repository: Arc<dyn PrincipalRepository>,
        role_repository: Arc<dyn RoleRepository>,
        assignment_repository: Arc<dyn RoleAssignmentRepository>,
        cache: Arc<dyn PermissionCache>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            principal_repository,
            role_repository,
            assignment_repository,
            cache,
            gate: AuthorizationGate::new(audit_repository.clone()),
            audit_trail: AuditTrail::new(audit_repository),
        }
    }

    /// Grants a role, reactivating an earlier binding for the same triple.
    pub async fn assign(
        &self,
        actor: &AuthContext,
        input: AssignRoleInput,
    ) -> AppResult<RoleAssignment> {
        let role = self.load_role(input.role_id).await?;
        self.ensure_no_escalation(actor, &role, &input.additional_grants, "grant")
            .await?;
        self.gate
            .require(actor, catalog::SECURITY_ROLES_ASSIGN)
            .await?;
        self.ensure_tenant_scope(actor, &role, input.tenant_id).await?;

        if !role.is_active() {
            return Err(AppError::NotFound(format!(
                "role '{}' was not found",
                role.id()
            )));
        }

        self.ensure_principal_in_tenant(input.principal_id, input.tenant_id)
            .await?;

        if let Some(expires_at) = input.expires_at
            && expires_at <= Utc::now()
        {
            return Err(AppError::Validation(format!(
                "assignment expiry '{expires_at}' is not in the future"
            )));
        }

        let assignment = self
            .assignment_repository
            .upsert_assignment(
                AssignmentKey {
                    principal_id: input.principal_id,
                    role_id: role.id(),
                    tenant_id: input.tenant_id,
                },
                AssignmentPatch {
                    expires_at: input.expires_at,
                    additional_grants: input.additional_grants,
                    revocations: input.revocations,
                    granted_by: actor.principal_id(),
                    scope: input.scope,
                },
            )
            .await?;

        self.cache.invalidate(input.principal_id).await;
        info!(
            principal_id = %input.principal_id,
            role_id = %role.id(),
            tenant_id = %input.tenant_id,
            "role assigned"
        );

        self.audit_trail
            .record(AuditEvent {
                tenant_id: input.tenant_id,
                subject: actor.principal_id().to_string(),
                action: AuditAction::SecurityRoleAssigned,
                resource_type: "rbac_role_assignment".to_owned(),
                resource_id: assignment.id.to_string(),
                detail: Some(format!(
                    "assigned role '{}' to principal '{}'",
                    role.slug(),
                    input.principal_id
                )),
            })
            .await;

        Ok(assignment)
    }

    /// Revokes an active binding by clearing its active flag.
    pub async fn revoke(&self, actor: &AuthContext, input: RevokeRoleInput) -> AppResult<()> {
        let role = self.load_role(input.role_id).await?;
        self.ensure_no_escalation(actor, &role, &[], "revoke").await?;
        self.gate
            .require(actor, catalog::SECURITY_ROLES_ASSIGN)
            .await?;
        self.ensure_tenant_scope(actor, &role, input.tenant_id).await?;

        let assignment = self
            .assignment_repository
            .find_assignments(AssignmentFilter {
                principal_id: Some(input.principal_id),
                role_id: Some(input.role_id),
                tenant_id: Some(input.tenant_id),
                state: AssignmentState::Active,
            })
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "principal '{}' does not hold role '{}'",
                    input.principal_id, input.role_id
                ))
            })?;

        self.assignment_repository
            .update_assignment(
                assignment.id,
                AssignmentUpdate {
                    is_active: Some(false),
                },
            )
            .await?;

        self.cache.invalidate(input.principal_id).await;
        info!(
            principal_id = %input.principal_id,
            role_id = %input.role_id,
            tenant_id = %input.tenant_id,
            "role revoked"
        );

        self.audit_trail
            .record(AuditEvent {
                tenant_id: input.tenant_id,
                subject: actor.principal_id().to_string(),
                action: AuditAction::SecurityRoleRevoked,
                resource_type: "rbac_role_assignment".to_owned(),
                resource_id: assignment.id.to_string(),
                detail: Some(format!(
                    "revoked role '{}' from principal '{}'",
                    role.slug(),
                    input.principal_id
                )),
            })
            .await;

        Ok(())
    }

    /// Lists every binding, active or not, of a principal in the actor's tenant.
    pub async fn list_assignments(
        &self,
        actor: &AuthContext,
        principal_id: PrincipalId,
    ) -> AppResult<Vec<RoleAssignment>> {
        self.gate
            .require_any(
                actor,
                &[catalog::SECURITY_ROLES_ASSIGN, catalog::SECURITY_ROLES_MANAGE],
            )
            .await?;
        self.ensure_principal_in_tenant(principal_id, actor.tenant_id())
            .await?;

        self.assignment_repository
            .find_assignments(AssignmentFilter {
                principal_id: Some(principal_id),
                role_id: None,
                tenant_id: Some(actor.tenant_id()),
                state: AssignmentState::Any,
            })
            .await
    }

    async fn load_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.role_repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' was not found")))
    }

    async fn ensure_no_escalation(
        &self,
        actor: &AuthContext,
        role: &Role,
        additional_grants: &[PermissionKey],
        operation: &str,
    ) -> AppResult<()> {
        let escalates = role.is_superuser_role()
            || role.permissions().iter().any(PermissionKey::is_wildcard)
            || additional_grants.iter().any(PermissionKey::is_wildcard);

        if !escalates || actor.is_superuser() {
            return Ok(());
        }

        self.audit_trail
            .record(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::SecurityEscalationDenied,
                resource_type: "rbac_role".to_owned(),
                resource_id: role.id().to_string(),
                detail: Some(format!(
                    "non-superuser attempted to {operation} role '{}'",
                    role.slug()
                )),
            })
            .await;

        Err(AppError::EscalationDenied(format!(
            "only a superuser may {operation} role '{}'",
            role.slug()
        )))
    }

    async fn ensure_tenant_scope(
        &self,
        actor: &AuthContext,
        role: &Role,
        tenant_id: TenantId,
    ) -> AppResult<()> {
        let violation = if !actor.is_superuser() && tenant_id != actor.tenant_id() {
            Some(format!("tenant '{tenant_id}' is outside the actor's tenant"))
        } else if !role.is_available_to(tenant_id) {
            Some(format!(
                "role '{}' is not available in tenant '{tenant_id}'",
                role.slug()
            ))
        } else {
            None
        };

        let Some(message) = violation else {
            return Ok(());
        };

        self.audit_trail
            .record(AuditEvent {
                tenant_id: actor.tenant_id(),
                subject: actor.principal_id().to_string(),
                action: AuditAction::SecurityTenantScopeDenied,
                resource_type: "rbac_role_assignment".to_owned(),
                resource_id: role.id().to_string(),
                detail: Some(message.clone()),
            })
            .await;

        Err(AppError::CrossTenantViolation(message))
    }

    async fn ensure_principal_in_tenant(
        &self,
        principal_id: PrincipalId,
        tenant_id: TenantId,
    ) -> AppResult<()> {
        self.principal_repository
            .find_principal(principal_id)
            .await?
            .filter(|principal| principal.tenant_id() == tenant_id)
            .map(|_| ())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "principal '{principal_id}' was not found in tenant '{tenant_id}'"
                ))
            })
    }
}
