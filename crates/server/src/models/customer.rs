//! Customers owned by a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crm_core::{CustomerId, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub user_id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Ordered, free-form interaction records.
    pub interactions: Vec<Value>,
    pub created_at: DateTime<Utc>,
}

/// Body for creating or replacing a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct CustomerInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub interactions: Value,
}

impl CustomerInput {
    /// The interactions to store. Anything but a JSON array becomes empty.
    #[must_use]
    pub fn interactions(&self) -> Vec<Value> {
        normalize_interactions(self.interactions.clone())
    }
}

/// Keep a JSON array as-is and replace anything else with `[]`.
#[must_use]
pub fn normalize_interactions(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}
