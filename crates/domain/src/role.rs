use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use warden_core::{AppError, AppResult, NonEmptyString, TenantId};

use crate::PermissionKey;

/// Slug of the distinguished system role that grants the wildcard.
pub const SUPERUSER_ROLE_SLUG: &str = "superuser";

/// Unique identifier for a role record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a new random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
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

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for RoleId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid role id '{value}': {error}")))
    }
}

/// Functional area a role belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleModule {
    /// Customer relationship management.
    Crm,
    /// Enterprise resource planning.
    Erp,
    /// Human resource management.
    Hrms,
    /// Cross-module platform roles.
    Platform,
}

impl RoleModule {
    /// Returns a stable storage value for this module.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crm => "crm",
            Self::Erp => "erp",
            Self::Hrms => "hrms",
            Self::Platform => "platform",
        }
    }
}

impl FromStr for RoleModule {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "crm" => Ok(Self::Crm),
            "erp" => Ok(Self::Erp),
            "hrms" => Ok(Self::Hrms),
            "platform" => Ok(Self::Platform),
            _ => Err(AppError::Validation(format!(
                "unknown role module '{value}'"
            ))),
        }
    }
}

/// Named bundle of permission keys.
///
/// System roles are global seed data. Custom roles belong to one tenant and are
/// soft-deleted through the active flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: NonEmptyString,
    slug: String,
    module: RoleModule,
    permissions: Vec<PermissionKey>,
    is_system: bool,
    tenant_id: Option<TenantId>,
    is_active: bool,
}

impl Role {
    /// Creates a global system role.
    pub fn system(
        id: RoleId,
        name: impl Into<String>,
        module: RoleModule,
        permissions: Vec<PermissionKey>,
    ) -> AppResult<Self> {
        Self::build(id, name, module, permissions, true, None)
    }

    /// Creates a tenant-scoped custom role.
    pub fn custom(
        id: RoleId,
        tenant_id: TenantId,
        name: impl Into<String>,
        module: RoleModule,
        permissions: Vec<PermissionKey>,
    ) -> AppResult<Self> {
        Self::build(id, name, module, permissions, false, Some(tenant_id))
    }

    fn build(
        id: RoleId,
        name: impl Into<String>,
        module: RoleModule,
        permissions: Vec<PermissionKey>,
        is_system: bool,
        tenant_id: Option<TenantId>,
    ) -> AppResult<Self> {
        let name = NonEmptyString::new(name)?;
        let slug = Self::slugify(name.as_str())?;

        Ok(Self {
            id,
            name,
            slug,
            module,
            permissions: dedup_permissions(permissions),
            is_system,
            tenant_id,
            is_active: true,
        })
    }

    /// Overrides the derived slug, used when loading persisted roles.
    pub fn with_slug(mut self, slug: impl Into<String>) -> AppResult<Self> {
        let slug = slug.into();
        if Self::slugify(slug.as_str())? != slug {
            return Err(AppError::Validation(format!(
                "role slug '{slug}' is not normalized"
            )));
        }

        self.slug = slug;
        Ok(self)
    }

    /// Sets the active flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Derives a stable slug: lowercase ASCII alphanumerics separated by single dashes.
    pub fn slugify(name: &str) -> AppResult<String> {
        let mut slug = String::with_capacity(name.len());
        for character in name.trim().chars() {
            if character.is_ascii_alphanumeric() {
                slug.push(character.to_ascii_lowercase());
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }

        let slug = slug.trim_end_matches('-').to_owned();
        if slug.is_empty() {
            return Err(AppError::Validation(format!(
                "role name '{name}' does not contain any alphanumeric characters"
            )));
        }

        Ok(slug)
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn id(&self) -> RoleId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the stable slug.
    #[must_use]
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Returns the functional module.
    #[must_use]
    pub fn module(&self) -> RoleModule {
        self.module
    }

    /// Returns the granted permission keys.
    #[must_use]
    pub fn permissions(&self) -> &[PermissionKey] {
        &self.permissions
    }

    /// Returns whether the role is global seed data.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }

    /// Returns the owning tenant, `None` for global roles.
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    /// Returns whether the role has not been soft-deleted.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active
    }

    /// Returns whether the role is the distinguished superuser role.
    #[must_use]
    pub fn is_superuser_role(&self) -> bool {
        self.is_system && self.slug == SUPERUSER_ROLE_SLUG
    }

    /// Returns whether principals of the tenant may hold this role.
    #[must_use]
    pub fn is_available_to(&self, tenant_id: TenantId) -> bool {
        self.tenant_id.is_none_or(|owner| owner == tenant_id)
    }

    /// Renames the role. The slug stays stable.
    pub fn rename(&mut self, name: impl Into<String>) -> AppResult<()> {
        self.name = NonEmptyString::new(name)?;
        Ok(())
    }

    /// Changes the functional module.
    pub fn set_module(&mut self, module: RoleModule) {
        self.module = module;
    }

    /// Replaces the permission list and reports whether the effective list changed.
    pub fn replace_permissions(&mut self, permissions: Vec<PermissionKey>) -> bool {
        let permissions = dedup_permissions(permissions);
        if permissions == self.permissions {
            return false;
        }

        self.permissions = permissions;
        true
    }

    /// Marks the role as deleted.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    /// Copies this role into a new custom role owned by `tenant_id`.
    pub fn clone_into_tenant(
        &self,
        id: RoleId,
        tenant_id: TenantId,
        name: impl Into<String>,
    ) -> AppResult<Self> {
        Self::custom(id, tenant_id, name, self.module, self.permissions.clone())
    }
}

fn dedup_permissions(mut permissions: Vec<PermissionKey>) -> Vec<PermissionKey> {
    permissions.sort();
    permissions.dedup();
    permissions
}
