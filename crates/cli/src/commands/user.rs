//! User bootstrap command.
//!
//! The API only lets an admin register another admin, so the first admin
//! has to be created here.

use crm_core::{Email, Role, UserId};
use crm_server::db::{RepositoryError, UserRepository};
use crm_server::services::{PasswordError, hash_password};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Missing environment variable: CRM_DATABASE_URL (or DATABASE_URL)")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    InvalidRole(#[from] crm_core::RoleParseError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] crm_core::EmailError),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Failed to hash password: {0}")]
    Password(#[from] PasswordError),

    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Repository error: {0}")]
    Repository(RepositoryError),
}

/// Create a user with the given role.
///
/// # Errors
///
/// Returns an error if an argument is invalid, the email is taken, or the
/// database is unreachable.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<UserId, UserError> {
    let role: Role = role.parse()?;
    let email = Email::parse(email)?;
    if password.is_empty() {
        return Err(UserError::EmptyPassword);
    }

    let database_url = super::database_url().ok_or(UserError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = crm_server::db::create_pool(&database_url).await?;

    let password_hash = hash_password(password)?;

    let user = UserRepository::new(&pool)
        .create(&email, &password_hash, name, role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(email.to_string()),
            other => UserError::Repository(other),
        })?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id)
}
