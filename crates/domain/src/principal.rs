use serde::{Deserialize, Serialize};
use warden_core::{AppResult, NonEmptyString, PrincipalId, TenantId};

use crate::{LegacyRole, PermissionKey};

/// User record as seen by the authorization engine.
///
/// Principals are soft-deactivated, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: PrincipalId,
    tenant_id: TenantId,
    display_name: NonEmptyString,
    legacy_role: LegacyRole,
    direct_permissions: Vec<PermissionKey>,
    is_active: bool,
}

impl Principal {
    /// Creates an active principal without direct overrides.
    pub fn new(
        id: PrincipalId,
        tenant_id: TenantId,
        display_name: impl Into<String>,
        legacy_role: LegacyRole,
    ) -> AppResult<Self> {
        Ok(Self {
            id,
            tenant_id,
            display_name: NonEmptyString::new(display_name)?,
            legacy_role,
            direct_permissions: Vec::new(),
            is_active: true,
        })
    }

    /// Replaces direct permission overrides.
    #[must_use]
    pub fn with_direct_permissions(mut self, direct_permissions: Vec<PermissionKey>) -> Self {
        self.direct_permissions = direct_permissions;
        self
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns the principal identifier.
    #[must_use]
    pub fn id(&self) -> PrincipalId {
        self.id
    }

    /// Returns the tenant the principal belongs to.
    #[must_use]
    pub fn tenant_id(&self) -> TenantId {
        self.tenant_id
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }

    /// Returns the legacy role tag.
    #[must_use]
    pub fn legacy_role(&self) -> LegacyRole {
        self.legacy_role
    }

    /// Returns permissions granted directly on the principal record.
    #[must_use]
    pub fn direct_permissions(&self) -> &[PermissionKey] {
        &self.direct_permissions
    }

    /// Returns whether the principal may authenticate.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the legacy tag marks a platform superuser.
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        self.legacy_role == LegacyRole::Superuser
    }
}

#[cfg(test)]
mod tests {
    use warden_core::{PrincipalId, TenantId};

    use crate::LegacyRole;

    use super::Principal;

    #[test]
    fn principal_requires_display_name() {
        let result = Principal::new(PrincipalId::new(), TenantId::new(), " ", LegacyRole::Employee);
        assert!(result.is_err());
    }

    #[test]
    fn new_principal_is_active_without_overrides() {
        let principal = Principal::new(
            PrincipalId::new(),
            TenantId::new(),
            "Dana",
            LegacyRole::Manager,
        )
        .unwrap_or_else(|error| panic!("unexpected error: {error}"));

        assert!(principal.is_active());
        assert!(principal.direct_permissions().is_empty());
        assert!(!principal.is_superuser());
    }
}
