use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{PrincipalId, TenantId};

use crate::{PermissionKey, PermissionSet, RoleId};

/// Unique identifier for a role assignment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssignmentId(Uuid);

impl AssignmentId {
    /// Creates a new random assignment identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an assignment identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssignmentId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for AssignmentId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Binding of a principal to a role inside one tenant.
///
/// At most one row exists per (principal, role, tenant); re-granting reactivates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// Row identifier.
    pub id: AssignmentId,
    /// Principal holding the role.
    pub principal_id: PrincipalId,
    /// Granted role.
    pub role_id: RoleId,
    /// Tenant scope of the binding.
    pub tenant_id: TenantId,
    /// Cleared on revocation.
    pub is_active: bool,
    /// Optional instant after which the binding stops counting.
    pub expires_at: Option<DateTime<Utc>>,
    /// Extra keys granted by this binding only.
    pub additional_grants: Vec<PermissionKey>,
    /// Keys removed from this binding's own contribution.
    pub revocations: Vec<PermissionKey>,
    /// Actor that granted the binding.
    pub granted_by: PrincipalId,
    /// Optional branch or scope qualifier.
    pub scope: Option<String>,
}

impl RoleAssignment {
    /// Returns whether the binding counts at `now`.
    ///
    /// Expiry is evaluated on read; an expired row keeps `is_active = true` in storage.
    #[must_use]
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }

    /// Computes this binding's contribution from its role's keys.
    ///
    /// Role keys and additional grants are merged first, then this binding's revocations are
    /// removed. Revocations never reach keys contributed by other bindings.
    #[must_use]
    pub fn contribution(&self, role_permissions: &[PermissionKey]) -> PermissionSet {
        let mut contribution = PermissionSet::from_keys(role_permissions.iter().cloned());
        contribution.extend(self.additional_grants.iter().cloned());
        contribution.subtract(&self.revocations);
        contribution
    }
}
