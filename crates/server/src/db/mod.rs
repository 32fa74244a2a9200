//! Database operations for the CRM `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Accounts, password hashes and roles
//! - `customers` - Customers with JSONB interaction history
//! - `tasks` - Tasks, optionally linked to a customer
//! - `deals` - Deals with a `NUMERIC` amount
//! - `reports` - Append-only JSONB reports
//! - `notifications` - Per-user notification feed
//!
//! Every resource table carries a `user_id` owner column. Scoped queries are
//! built with [`QueryBuilder`] so the owner filter is appended only when the
//! access policy asks for it.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p crm-cli -- migrate
//! ```

pub mod analytics;
pub mod customers;
pub mod deals;
pub mod notifications;
pub mod reports;
pub mod tasks;
pub mod users;

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;

use crate::config::ConnectRetry;
use crate::policy::Scope;

pub use analytics::AnalyticsRepository;
pub use customers::CustomerRepository;
pub use deals::DealRepository;
pub use notifications::{NotificationRepository, PgNotificationStore};
pub use reports::ReportRepository;
pub use tasks::TaskRepository;
pub use users::{StoredCredentials, UserRepository};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Create the pool, retrying a fixed number of times with a fixed delay.
///
/// # Errors
///
/// Returns the last `sqlx::Error` once every attempt has failed.
pub async fn connect_with_retry(
    database_url: &SecretString,
    retry: ConnectRetry,
) -> Result<PgPool, sqlx::Error> {
    let mut attempt = 1;
    loop {
        match create_pool(database_url).await {
            Ok(pool) => {
                tracing::info!(attempt, "Database connected");
                return Ok(pool);
            }
            Err(e) if attempt < retry.attempts => {
                tracing::warn!(
                    attempt,
                    max_attempts = retry.attempts,
                    retry_in_secs = retry.delay.as_secs(),
                    error = %e,
                    "Database connection failed, retrying"
                );
                tokio::time::sleep(retry.delay).await;
                attempt += 1;
            }
            Err(e) => {
                tracing::error!(attempt, error = %e, "Database connection failed, giving up");
                return Err(e);
            }
        }
    }
}

/// Append the owner filter for `scope`, if it has one.
///
/// `has_where` says whether the statement already has a `WHERE` clause.
pub(crate) fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: Scope, has_where: bool) {
    if let Some(owner) = scope.owner() {
        qb.push(if has_where { " AND " } else { " WHERE " });
        qb.push("user_id = ").push_bind(owner);
    }
}

/// Map a unique violation to `Conflict`, everything else to `Database`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

#[cfg(test)]
mod tests {
    use crm_core::UserId;

    use super::*;

    #[test]
    fn test_owner_scope_adds_where() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM customers");
        push_scope(&mut qb, Scope::Owner(UserId::new(7)), false);
        assert_eq!(qb.sql(), "SELECT id FROM customers WHERE user_id = $1");
    }

    #[test]
    fn test_owner_scope_extends_where() {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM deals WHERE id = ");
        qb.push_bind(3_i32);
        push_scope(&mut qb, Scope::Owner(UserId::new(7)), true);
        assert_eq!(qb.sql(), "DELETE FROM deals WHERE id = $1 AND user_id = $2");
    }

    #[test]
    fn test_all_scope_adds_nothing() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM tasks");
        push_scope(&mut qb, Scope::All, false);
        assert_eq!(qb.sql(), "SELECT id FROM tasks");
    }
}
