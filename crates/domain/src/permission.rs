use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use warden_core::{AppError, AppResult};

/// Storage value of the wildcard permission key.
pub const WILDCARD_PERMISSION: &str = "*";

const PERMISSION_KEY_MAX_LENGTH: usize = 128;

/// Opaque permission key such as `crm.leads.view`.
///
/// Keys are open-ended configuration data, so they are validated strings rather than an enum.
/// Clones share one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionKey(Arc<str>);

impl PermissionKey {
    /// Creates a validated permission key.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let value = value.as_ref().trim();

        if value.is_empty() {
            return Err(AppError::Validation(
                "permission key must not be empty".to_owned(),
            ));
        }

        if value.len() > PERMISSION_KEY_MAX_LENGTH {
            return Err(AppError::Validation(format!(
                "permission key must not exceed {PERMISSION_KEY_MAX_LENGTH} characters"
            )));
        }

        if value != WILDCARD_PERMISSION
            && !value.chars().all(|character| {
                character.is_ascii_alphanumeric() || matches!(character, '.' | '_' | '-' | ':')
            })
        {
            return Err(AppError::Validation(format!(
                "permission key '{value}' contains unsupported characters"
            )));
        }

        Ok(Self(Arc::from(value)))
    }

    /// Returns the wildcard key.
    #[must_use]
    pub fn wildcard() -> Self {
        Self(Arc::from(WILDCARD_PERMISSION))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns whether this is the wildcard key.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.as_str() == WILDCARD_PERMISSION
    }

    /// Parses a list of transport values, rejecting the first invalid one.
    pub fn parse_all<I, S>(values: I) -> AppResult<Vec<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values.into_iter().map(Self::new).collect()
    }
}

impl Borrow<str> for PermissionKey {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Display for PermissionKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<String> for PermissionKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PermissionKey> for String {
    fn from(value: PermissionKey) -> Self {
        value.as_str().to_owned()
    }
}

/// Effective permission set of one principal.
///
/// Either an explicit set of keys or the wildcard, which satisfies every check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionSet {
    /// Every permission check succeeds.
    Wildcard,
    /// Exactly the listed keys are granted.
    Keys(BTreeSet<PermissionKey>),
}

impl Default for PermissionSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl PermissionSet {
    /// Returns an empty set.
    #[must_use]
    pub fn empty() -> Self {
        Self::Keys(BTreeSet::new())
    }

    /// Returns the wildcard set.
    #[must_use]
    pub fn wildcard() -> Self {
        Self::Wildcard
    }

    /// Builds a set from keys. A wildcard key collapses the set into [`PermissionSet::Wildcard`].
    #[must_use]
    pub fn from_keys<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = PermissionKey>,
    {
        let mut set = Self::empty();
        set.extend(keys);
        set
    }

    /// Returns whether this set is the wildcard.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Wildcard)
    }

    /// Returns whether the set grants nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Wildcard => false,
            Self::Keys(keys) => keys.is_empty(),
        }
    }

    /// Returns whether the key is granted, either explicitly or through the wildcard.
    #[must_use]
    pub fn grants(&self, key: &str) -> bool {
        match self {
            Self::Wildcard => true,
            Self::Keys(keys) => keys.contains(key),
        }
    }

    /// Adds one key.
    pub fn insert(&mut self, key: PermissionKey) {
        if key.is_wildcard() {
            *self = Self::Wildcard;
            return;
        }

        if let Self::Keys(keys) = self {
            keys.insert(key);
        }
    }

    /// Adds every key from the iterator.
    pub fn extend<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = PermissionKey>,
    {
        for key in keys {
            if self.is_wildcard() {
                return;
            }
            self.insert(key);
        }
    }

    /// Merges another set into this one.
    pub fn union_with(&mut self, other: &PermissionSet) {
        match other {
            Self::Wildcard => *self = Self::Wildcard,
            Self::Keys(keys) => self.extend(keys.iter().cloned()),
        }
    }

    /// Removes the given keys. The wildcard is left untouched.
    pub fn subtract<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a PermissionKey>,
    {
        if let Self::Keys(granted) = self {
            for key in keys {
                granted.remove(key.as_str());
            }
        }
    }

    /// Iterates explicit keys. The wildcard yields nothing.
    pub fn keys(&self) -> impl Iterator<Item = &PermissionKey> {
        let keys = match self {
            Self::Wildcard => None,
            Self::Keys(keys) => Some(keys.iter()),
        };
        keys.into_iter().flatten()
    }

    /// Returns the sorted key list embedded into credential claims, or `["*"]`.
    #[must_use]
    pub fn to_claim_list(&self) -> Vec<String> {
        match self {
            Self::Wildcard => vec![WILDCARD_PERMISSION.to_owned()],
            Self::Keys(keys) => keys.iter().map(|key| key.as_str().to_owned()).collect(),
        }
    }
}

/// Permission keys known to the dashboard modules.
///
/// The catalog is reference data for seeding and the legacy fallback; any other
/// well-formed key is still accepted on roles and overrides.
pub mod catalog {
    /// View CRM leads.
    pub const CRM_LEADS_VIEW: &str = "crm.leads.view";
    /// Create and edit CRM leads.
    pub const CRM_LEADS_MANAGE: &str = "crm.leads.manage";
    /// View CRM deals.
    pub const CRM_DEALS_VIEW: &str = "crm.deals.view";
    /// Create and edit CRM deals.
    pub const CRM_DEALS_MANAGE: &str = "crm.deals.manage";
    /// View CRM reports.
    pub const CRM_REPORTS_VIEW: &str = "crm.reports.view";
    /// View ERP invoices.
    pub const ERP_INVOICES_VIEW: &str = "erp.invoices.view";
    /// Create and edit ERP invoices.
    pub const ERP_INVOICES_MANAGE: &str = "erp.invoices.manage";
    /// Approve ERP invoices.
    pub const ERP_INVOICES_APPROVE: &str = "erp.invoices.approve";
    /// View ERP inventory.
    pub const ERP_INVENTORY_VIEW: &str = "erp.inventory.view";
    /// Adjust ERP inventory.
    pub const ERP_INVENTORY_MANAGE: &str = "erp.inventory.manage";
    /// View HRMS employee records.
    pub const HRMS_EMPLOYEES_VIEW: &str = "hrms.employees.view";
    /// Edit HRMS employee records.
    pub const HRMS_EMPLOYEES_MANAGE: &str = "hrms.employees.manage";
    /// Apply for leave.
    pub const HRMS_LEAVES_APPLY: &str = "hrms.leaves.apply";
    /// Approve leave requests.
    pub const HRMS_LEAVES_APPROVE: &str = "hrms.leaves.approve";
    /// View own payslips.
    pub const HRMS_PAYSLIPS_VIEW: &str = "hrms.payslips.view";
    /// View dashboards.
    pub const DASHBOARD_VIEW: &str = "dashboard.view";
    /// Create, edit, clone and delete roles.
    pub const SECURITY_ROLES_MANAGE: &str = "security.roles.manage";
    /// Grant and revoke role assignments.
    pub const SECURITY_ROLES_ASSIGN: &str = "security.roles.assign";
    /// Read the audit trail.
    pub const SECURITY_AUDIT_VIEW: &str = "security.audit.view";
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{PermissionKey, PermissionSet};

    fn key(value: &str) -> PermissionKey {
        PermissionKey::new(value).unwrap_or_else(|error| panic!("invalid key '{value}': {error}"))
    }

    fn set(values: &[&str]) -> PermissionSet {
        PermissionSet::from_keys(values.iter().map(|value| key(value)))
    }

    #[test]
    fn permission_key_rejects_whitespace_and_empty_values() {
        assert!(PermissionKey::new("").is_err());
        assert!(PermissionKey::new("   ").is_err());
        assert!(PermissionKey::new("crm leads").is_err());
    }

    #[test]
    fn permission_key_trims_and_accepts_wildcard() {
        assert_eq!(key(" crm.leads.view ").as_str(), "crm.leads.view");
        assert!(key("*").is_wildcard());
    }

    #[test]
    fn permission_key_deserialization_validates() {
        let parsed: Result<PermissionKey, _> = serde_json::from_str("\"erp.invoices.view\"");
        assert!(parsed.is_ok());

        let rejected: Result<PermissionKey, _> = serde_json::from_str("\"bad key\"");
        assert!(rejected.is_err());
    }

    #[test]
    fn wildcard_key_collapses_set() {
        let permissions = set(&["crm.leads.view", "*"]);
        assert!(permissions.is_wildcard());
        assert!(permissions.grants("anything.at.all"));
    }

    #[test]
    fn subtract_leaves_wildcard_untouched() {
        let mut permissions = PermissionSet::wildcard();
        permissions.subtract(&[key("crm.leads.view")]);
        assert!(permissions.grants("crm.leads.view"));
    }

    #[test]
    fn claim_list_is_sorted() {
        let permissions = set(&["hrms.leaves.apply", "crm.deals.view"]);
        assert_eq!(
            permissions.to_claim_list(),
            vec!["crm.deals.view".to_owned(), "hrms.leaves.apply".to_owned()]
        );
        assert_eq!(PermissionSet::wildcard().to_claim_list(), vec!["*".to_owned()]);
    }

    proptest! {
        #[test]
        fn wildcard_grants_every_well_formed_key(value in "[a-z]{1,8}(\\.[a-z_]{1,8}){0,3}") {
            prop_assert!(PermissionSet::wildcard().grants(value.as_str()));
        }

        #[test]
        fn union_contains_both_operands(
            left in proptest::collection::btree_set("[a-z]{1,6}\\.[a-z]{1,6}", 0..8),
            right in proptest::collection::btree_set("[a-z]{1,6}\\.[a-z]{1,6}", 0..8),
        ) {
            let mut merged = set(&left.iter().map(String::as_str).collect::<Vec<_>>());
            merged.union_with(&set(&right.iter().map(String::as_str).collect::<Vec<_>>()));

            for value in left.iter().chain(right.iter()) {
                prop_assert!(merged.grants(value.as_str()));
            }
            prop_assert_eq!(merged.keys().count(), left.union(&right).count());
        }

        #[test]
        fn subtract_removes_exactly_the_revoked_keys(
            granted in proptest::collection::btree_set("[a-z]{1,6}\\.[a-z]{1,6}", 0..8),
            revoked in proptest::collection::btree_set("[a-z]{1,6}\\.[a-z]{1,6}", 0..8),
        ) {
            let mut permissions = set(&granted.iter().map(String::as_str).collect::<Vec<_>>());
            let revoked_keys = revoked.iter().map(|value| key(value)).collect::<Vec<_>>();
            permissions.subtract(&revoked_keys);

            for value in &granted {
                prop_assert_eq!(permissions.grants(value.as_str()), !revoked.contains(value));
            }
        }
    }
}
