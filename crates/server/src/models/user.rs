//! User accounts and the authenticated caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crm_core::{Email, Role, UserId};

/// The authenticated caller, taken from a verified bearer token.
///
/// Lives for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
}

/// A registered user. The password hash never leaves the repository.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// `POST /api/users/register` body.
#[derive(Deserialize)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl std::fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterInput")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("role", &self.role)
            .finish()
    }
}

/// `POST /api/users/login` body.
#[derive(Deserialize)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Successful login: a bearer token plus the public profile.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/users/upgrade` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeInput {
    pub user_id: UserId,
    pub promo_code: String,
}

/// `PUT /api/users/{id}/role` body.
///
/// The role is kept as a string so an unknown value is reported as a
/// validation error naming the value, not as a body rejection.
#[derive(Debug, Deserialize)]
pub struct RoleUpdateInput {
    pub role: String,
}
