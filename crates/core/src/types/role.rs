//! Caller role.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a string is not one of the known roles.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid role: {0} (expected user, admin or premium)")]
pub struct RoleParseError(pub String);

/// Role attached to every user and embedded in every bearer token.
///
/// `Admin` widens resource queries to every tenant's rows. `Premium` unlocks
/// the advanced analytics aggregate. `User` is the default for new accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    User,
    Admin,
    Premium,
}

impl Role {
    /// All roles, in privilege-agnostic declaration order.
    pub const ALL: [Self; 3] = [Self::User, Self::Admin, Self::Premium];

    /// The wire/database spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Premium => "premium",
        }
    }

    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "premium" => Ok(Self::Premium),
            _ => Err(RoleParseError(s.to_owned())),
        }
    }
}
