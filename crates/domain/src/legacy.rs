use std::str::FromStr;

use serde::{Deserialize, Serialize};
use warden_core::AppError;

use crate::permission::catalog;
use crate::{PermissionKey, PermissionSet};

/// Coarse role tag carried on every principal record, predating role assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyRole {
    /// Platform operator; resolves to the wildcard.
    Superuser,
    /// Tenant administrator.
    Admin,
    /// Team manager.
    Manager,
    /// Regular employee.
    Employee,
}

impl LegacyRole {
    /// Returns a stable storage value for this role tag.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Superuser => "superuser",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }

    /// Returns all role tags.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[LegacyRole] = &[
            LegacyRole::Superuser,
            LegacyRole::Admin,
            LegacyRole::Manager,
            LegacyRole::Employee,
        ];

        ALL
    }
}

impl FromStr for LegacyRole {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "superuser" => Ok(Self::Superuser),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "employee" => Ok(Self::Employee),
            _ => Err(AppError::Validation(format!(
                "unknown legacy role '{value}'"
            ))),
        }
    }
}

const EMPLOYEE_PERMISSIONS: &[&str] = &[
    catalog::DASHBOARD_VIEW,
    catalog::HRMS_LEAVES_APPLY,
    catalog::HRMS_PAYSLIPS_VIEW,
    catalog::CRM_LEADS_VIEW,
];

const MANAGER_PERMISSIONS: &[&str] = &[
    catalog::DASHBOARD_VIEW,
    catalog::HRMS_LEAVES_APPLY,
    catalog::HRMS_LEAVES_APPROVE,
    catalog::HRMS_PAYSLIPS_VIEW,
    catalog::HRMS_EMPLOYEES_VIEW,
    catalog::CRM_LEADS_VIEW,
    catalog::CRM_LEADS_MANAGE,
    catalog::CRM_DEALS_VIEW,
    catalog::CRM_DEALS_MANAGE,
    catalog::CRM_REPORTS_VIEW,
    catalog::ERP_INVOICES_VIEW,
    catalog::ERP_INVENTORY_VIEW,
];

const ADMIN_PERMISSIONS: &[&str] = &[
    catalog::DASHBOARD_VIEW,
    catalog::HRMS_LEAVES_APPLY,
    catalog::HRMS_LEAVES_APPROVE,
    catalog::HRMS_PAYSLIPS_VIEW,
    catalog::HRMS_EMPLOYEES_VIEW,
    catalog::HRMS_EMPLOYEES_MANAGE,
    catalog::CRM_LEADS_VIEW,
    catalog::CRM_LEADS_MANAGE,
    catalog::CRM_DEALS_VIEW,
    catalog::CRM_DEALS_MANAGE,
    catalog::CRM_REPORTS_VIEW,
    catalog::ERP_INVOICES_VIEW,
    catalog::ERP_INVOICES_MANAGE,
    catalog::ERP_INVOICES_APPROVE,
    catalog::ERP_INVENTORY_VIEW,
    catalog::ERP_INVENTORY_MANAGE,
    catalog::SECURITY_ROLES_MANAGE,
    catalog::SECURITY_ROLES_ASSIGN,
    catalog::SECURITY_AUDIT_VIEW,
];

/// Versioned fallback table from [`LegacyRole`] to permissions.
///
/// Only consulted for principals without any effective role assignment. Editing a row changes
/// authorization for every such principal, so bump [`LegacyPermissionMap::VERSION`] with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyPermissionMap;

impl LegacyPermissionMap {
    /// Version of the table below.
    pub const VERSION: u32 = 1;

    /// Returns the permission set for a legacy role tag.
    #[must_use]
    pub fn fallback_for(role: LegacyRole) -> PermissionSet {
        let keys = match role {
            LegacyRole::Superuser => return PermissionSet::wildcard(),
            LegacyRole::Admin => ADMIN_PERMISSIONS,
            LegacyRole::Manager => MANAGER_PERMISSIONS,
            LegacyRole::Employee => EMPLOYEE_PERMISSIONS,
        };

        PermissionSet::from_keys(
            keys.iter()
                .filter_map(|value| PermissionKey::new(value).ok()),
        )
    }
}
