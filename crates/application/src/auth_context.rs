use warden_core::{PrincipalId, TenantId};
use warden_domain::{PermissionSet, Principal};

/// Authenticated request context: the principal and its resolved permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    principal: Principal,
    permissions: PermissionSet,
}

impl AuthContext {
    /// Creates a context from a loaded principal and its resolved set.
    #[must_use]
    pub fn new(principal: Principal, permissions: PermissionSet) -> Self {
        Self {
            principal,
            permissions,
        }
    }

    /// Returns the authenticated principal.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Returns the resolved permission set.
    #[must_use]
    pub fn permissions(&self) -> &PermissionSet {
        &self.permissions
    }

    /// Returns the principal identifier.
    #[must_use]
    pub fn principal_id(&self) -> PrincipalId {
        self.principal.id()
    }

    /// Returns the principal's tenant.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.principal.tenant_id()
    }

    /// Returns whether the actor is a superuser, by legacy tag or by a wildcard grant.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.principal.is_superuser() || self.permissions.is_wildcard()
    }
}
