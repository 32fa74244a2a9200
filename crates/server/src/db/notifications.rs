//! Notification repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, QueryBuilder};

use crm_core::{NotificationId, UserId};

use super::{RepositoryError, push_scope};
use crate::models::Notification;
use crate::policy::Scope;
use crate::services::notifier::NotificationStore;

#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: i32,
    user_id: i32,
    message: String,
    is_read: bool,
    created_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(row: NotificationRow) -> Self {
        Self {
            id: NotificationId::new(row.id),
            user_id: UserId::new(row.user_id),
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        }
    }
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, message, is_read, created_at";

pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List notifications, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, scope: Scope) -> Result<Vec<Notification>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications"
        ));
        push_scope(&mut qb, scope, false);
        qb.push(" ORDER BY created_at DESC, id DESC");

        let rows = qb
            .build_query_as::<NotificationRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        message: &str,
    ) -> Result<Notification, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(&format!(
            "INSERT INTO notifications (user_id, message) VALUES ($1, $2) \
             RETURNING {NOTIFICATION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(message)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Flag a notification as read. Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_read(
        &self,
        id: NotificationId,
        scope: Scope,
    ) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::new("UPDATE notifications SET is_read = TRUE WHERE id = ");
        qb.push_bind(id);
        push_scope(&mut qb, scope, true);

        Ok(qb.build().execute(self.pool).await?.rows_affected())
    }
}

/// [`NotificationStore`] backed by the `notifications` table.
#[derive(Debug, Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for PgNotificationStore {
    async fn insert(&self, user_id: UserId, message: &str) -> Result<(), RepositoryError> {
        NotificationRepository::new(&self.pool)
            .create(user_id, message)
            .await
            .map(|_| ())
    }
}
