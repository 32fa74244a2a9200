//! Persisted notifications addressed to a single user.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crm_core::{NotificationId, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    /// The user the notification is addressed to.
    pub user_id: UserId,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
