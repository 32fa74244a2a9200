//! Tasks, optionally linked to a customer.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crm_core::{CustomerId, TaskId, UserId};

/// Status given to tasks created without one.
pub const DEFAULT_TASK_STATUS: &str = "pending";

/// Status counted as done by the analytics aggregate.
pub const COMPLETED_TASK_STATUS: &str = "completed";

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub user_id: UserId,
    pub customer_id: Option<CustomerId>,
    pub title: String,
    pub description: Option<String>,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskInput {
    #[serde(default)]
    pub customer_id: Option<CustomerId>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_task_input_parses_due_date() {
        let input: TaskInput = serde_json::from_str(
            r#"{"title":"Call back","customer_id":4,"due_date":"2025-03-01"}"#,
        )
        .unwrap();
        assert_eq!(input.customer_id, Some(CustomerId::new(4)));
        assert_eq!(input.due_date, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(input.status, None);
    }
}
