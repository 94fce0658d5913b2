use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_core::AppError;

/// Stable audit actions emitted by the authorization engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A permission check failed.
    SecurityAccessDenied,
    /// A non-superuser tried to grant or revoke the superuser role.
    SecurityEscalationDenied,
    /// A mutation crossed the actor's tenant or touched a protected system role.
    SecurityTenantScopeDenied,
    /// A custom role was created.
    SecurityRoleCreated,
    /// A role's metadata or permissions changed.
    SecurityRoleUpdated,
    /// A role was soft-deleted.
    SecurityRoleDeleted,
    /// A role was cloned into a tenant.
    SecurityRoleCloned,
    /// A role was assigned to a principal.
    SecurityRoleAssigned,
    /// A role assignment was revoked.
    SecurityRoleRevoked,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SecurityAccessDenied => "security.access.denied",
            Self::SecurityEscalationDenied => "security.escalation.denied",
            Self::SecurityTenantScopeDenied => "security.tenant_scope.denied",
            Self::SecurityRoleCreated => "security.role.created",
            Self::SecurityRoleUpdated => "security.role.updated",
            Self::SecurityRoleDeleted => "security.role.deleted",
            Self::SecurityRoleCloned => "security.role.cloned",
            Self::SecurityRoleAssigned => "security.role.assigned",
            Self::SecurityRoleRevoked => "security.role.revoked",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "security.access.denied" => Ok(Self::SecurityAccessDenied),
            "security.escalation.denied" => Ok(Self::SecurityEscalationDenied),
            "security.tenant_scope.denied" => Ok(Self::SecurityTenantScopeDenied),
            "security.role.created" => Ok(Self::SecurityRoleCreated),
            "security.role.updated" => Ok(Self::SecurityRoleUpdated),
            "security.role.deleted" => Ok(Self::SecurityRoleDeleted),
            "security.role.cloned" => Ok(Self::SecurityRoleCloned),
            "security.role.assigned" => Ok(Self::SecurityRoleAssigned),
            "security.role.revoked" => Ok(Self::SecurityRoleRevoked),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}
