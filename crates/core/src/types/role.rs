//! Role names as issued by the user service.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a role string is blank.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("role name cannot be empty")]
pub struct RoleParseError;

/// A role known to the client, matched case-insensitively.
///
/// Any name the client has no special handling for is kept verbatim in
/// [`RoleKind::Other`], so a server-side role added later still round-trips.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RoleKind {
    /// Full access to catalogs, users, roles and sales.
    Admin,
    /// Read-only access to products.
    Consultant,
    /// Products and sales, with editing.
    Seller,
    /// Any other role name.
    Other(String),
}

impl RoleKind {
    /// Role assigned to self-registered accounts.
    pub const DEFAULT_SIGNUP: Self = Self::Consultant;

    /// Classify a role name, ignoring case and surrounding whitespace.
    #[must_use]
    pub fn classify(name: &str) -> Self {
        let trimmed = name.trim();
        match trimmed.to_lowercase().as_str() {
            "admin" => Self::Admin,
            "consultant" => Self::Consultant,
            "seller" => Self::Seller,
            _ => Self::Other(trimmed.to_owned()),
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Consultant => "consultant",
            Self::Seller => "seller",
            Self::Other(name) => name,
        }
    }

    /// Whether this role may create, edit and delete products and sales.
    #[must_use]
    pub const fn can_edit(&self) -> bool {
        matches!(self, Self::Admin | Self::Seller)
    }
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleKind {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(RoleParseError);
        }
        Ok(Self::classify(s))
    }
}

impl TryFrom<String> for RoleKind {
    type Error = RoleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RoleKind> for String {
    fn from(role: RoleKind) -> Self {
        role.as_str().to_owned()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_ignores_case() {
        assert_eq!(RoleKind::classify("ADMIN"), RoleKind::Admin);
        assert_eq!(RoleKind::classify(" Seller "), RoleKind::Seller);
        assert_eq!(RoleKind::classify("consultant"), RoleKind::Consultant);
        assert_eq!(
            RoleKind::classify("Auditor"),
            RoleKind::Other("Auditor".to_owned())
        );
    }

    #[test]
    fn test_can_edit() {
        assert!(RoleKind::Admin.can_edit());
        assert!(RoleKind::Seller.can_edit());
        assert!(!RoleKind::Consultant.can_edit());
        assert!(!RoleKind::classify("guest").can_edit());
    }

    #[test]
    fn test_blank_is_rejected() {
        assert_eq!("  ".parse::<RoleKind>(), Err(RoleParseError));
        assert!(serde_json::from_str::<RoleKind>("\"\"").is_err());
    }

    #[test]
    fn test_serde_uses_canonical_name() {
        let role: RoleKind = serde_json::from_str("\"Admin\"").unwrap();
        assert_eq!(role, RoleKind::Admin);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"admin\"");
    }
}
