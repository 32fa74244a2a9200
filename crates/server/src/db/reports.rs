//! Report repository. Reports are only listed and created.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, QueryBuilder};

use crm_core::{ReportId, UserId};

use super::{RepositoryError, push_scope};
use crate::models::{Report, ReportInput};
use crate::policy::Scope;

#[derive(Debug, sqlx::FromRow)]
struct ReportRow {
    id: i32,
    user_id: i32,
    title: String,
    data: Json<Value>,
    created_at: DateTime<Utc>,
}

impl From<ReportRow> for Report {
    fn from(row: ReportRow) -> Self {
        Self {
            id: ReportId::new(row.id),
            user_id: UserId::new(row.user_id),
            title: row.title,
            data: row.data.0,
            created_at: row.created_at,
        }
    }
}

const REPORT_COLUMNS: &str = "id, user_id, title, data, created_at";

pub struct ReportRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ReportRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, scope: Scope) -> Result<Vec<Report>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {REPORT_COLUMNS} FROM reports"));
        push_scope(&mut qb, scope, false);
        qb.push(" ORDER BY id");

        let rows = qb.build_query_as::<ReportRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        owner: UserId,
        input: &ReportInput,
    ) -> Result<Report, RepositoryError> {
        let row = sqlx::query_as::<_, ReportRow>(&format!(
            "INSERT INTO reports (user_id, title, data) VALUES ($1, $2, $3) \
             RETURNING {REPORT_COLUMNS}"
        ))
        .bind(owner)
        .bind(&input.title)
        .bind(Json(&input.data))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }
}
