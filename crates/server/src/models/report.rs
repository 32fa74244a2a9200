//! Saved reports. Reports are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crm_core::{ReportId, UserId};

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: ReportId,
    pub user_id: UserId,
    pub title: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportInput {
    pub title: String,
    #[serde(default)]
    pub data: Value,
}
