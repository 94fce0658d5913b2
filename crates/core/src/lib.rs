//! Shared primitives for all Rust crates in Warden.

#![forbid(unsafe_code)]

/// Principal identity primitives shared across services.
pub mod identity;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use identity::PrincipalId;

/// Result type used across Warden crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string. Surrounding whitespace is trimmed.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Tenant (organization) identifier; the isolation boundary for roles and assignments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Creates a random tenant identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a tenant identifier from an existing UUID value.
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

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TenantId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Credential missing, invalid or expired, or the principal is missing or inactive.
    ///
    /// Carries no detail so callers cannot tell the cases apart.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated principal lacks the listed permission keys.
    #[error("forbidden: missing permission {}", .required.join(", "))]
    Forbidden {
        /// Permission keys required by the rejected operation.
        required: Vec<String>,
    },

    /// Non-superuser attempted to grant or revoke the superuser role.
    #[error("forbidden: {0}")]
    EscalationDenied(String),

    /// Mutation outside the actor's tenant, or of a protected system role.
    #[error("forbidden: {0}")]
    CrossTenantViolation(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a forbidden error for a single missing permission key.
    #[must_use]
    pub fn missing_permission(key: impl Into<String>) -> Self {
        Self::Forbidden {
            required: vec![key.into()],
        }
    }

    /// Returns whether the error belongs to the forbidden family.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            Self::Forbidden { .. } | Self::EscalationDenied(_) | Self::CrossTenantViolation(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{AppError, NonEmptyString, TenantId};

    #[test]
    fn non_empty_string_rejects_whitespace() {
        let result = NonEmptyString::new("   ");
        assert!(result.is_err());
    }

    #[test]
    fn non_empty_string_trims_input() {
        let value = NonEmptyString::new("  Sales Lead ")
            .unwrap_or_else(|error| panic!("unexpected error: {error}"));
        assert_eq!(value.as_str(), "Sales Lead");
    }

    #[test]
    fn tenant_id_formats_as_uuid() {
        let tenant_id = TenantId::new();
        assert_eq!(tenant_id.to_string().len(), 36);
    }

    #[test]
    fn forbidden_family_is_detected() {
        assert!(AppError::missing_permission("crm.leads.view").is_forbidden());
        assert!(AppError::EscalationDenied("superuser".to_owned()).is_forbidden());
        assert!(AppError::CrossTenantViolation("tenant".to_owned()).is_forbidden());
        assert!(!AppError::Unauthenticated.is_forbidden());
        assert!(!AppError::NotFound("role".to_owned()).is_forbidden());
    }

    #[test]
    fn forbidden_message_lists_missing_keys() {
        let error = AppError::Forbidden {
            required: vec!["erp.invoices.approve".to_owned(), "erp.invoices.view".to_owned()],
        };
        assert_eq!(
            error.to_string(),
            "forbidden: missing permission erp.invoices.approve, erp.invoices.view"
        );
    }

    #[test]
    fn unauthenticated_message_is_uniform() {
        assert_eq!(AppError::Unauthenticated.to_string(), "authentication required");
    }
}
