use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppError;

/// Stable identifier of an authenticated actor (user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    /// Creates a random principal identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a principal identifier from an existing UUID value.
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

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PrincipalId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for PrincipalId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid principal id '{value}': {error}")))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::PrincipalId;

    #[test]
    fn principal_id_parses_its_display_form() {
        let principal_id = PrincipalId::new();
        let parsed = PrincipalId::from_str(principal_id.to_string().as_str());
        assert!(matches!(parsed, Ok(value) if value == principal_id));
    }

    #[test]
    fn principal_id_rejects_garbage() {
        assert!(PrincipalId::from_str("not-a-uuid").is_err());
    }
}
