//! Task repository.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, QueryBuilder};

use crm_core::{CustomerId, TaskId, UserId};

use super::{RepositoryError, push_scope};
use crate::models::task::DEFAULT_TASK_STATUS;
use crate::models::{Task, TaskInput};
use crate::policy::Scope;

#[derive(Debug, sqlx::FromRow)]
struct TaskRow {
    id: i32,
    user_id: i32,
    customer_id: Option<i32>,
    title: String,
    description: Option<String>,
    status: String,
    due_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Self {
            id: TaskId::new(row.id),
            user_id: UserId::new(row.user_id),
            customer_id: row.customer_id.map(CustomerId::new),
            title: row.title,
            description: row.description,
            status: row.status,
            due_date: row.due_date,
            created_at: row.created_at,
        }
    }
}

const TASK_COLUMNS: &str =
    "id, user_id, customer_id, title, description, status, due_date, created_at";

pub struct TaskRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TaskRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, scope: Scope) -> Result<Vec<Task>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
        push_scope(&mut qb, scope, false);
        qb.push(" ORDER BY id");

        let rows = qb.build_query_as::<TaskRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a task owned by `owner`. A missing status becomes `pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, including an
    /// unknown `customer_id`.
    pub async fn create(&self, owner: UserId, input: &TaskInput) -> Result<Task, RepositoryError> {
        let row = sqlx::query_as::<_, TaskRow>(&format!(
            "INSERT INTO tasks (user_id, customer_id, title, description, status, due_date) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TASK_COLUMNS}"
        ))
        .bind(owner)
        .bind(input.customer_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.status.as_deref().unwrap_or(DEFAULT_TASK_STATUS))
        .bind(input.due_date)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a task's fields. A missing status keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: TaskId,
        scope: Scope,
        input: &TaskInput,
    ) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::new("UPDATE tasks SET customer_id = ");
        qb.push_bind(input.customer_id)
            .push(", title = ")
            .push_bind(&input.title)
            .push(", description = ")
            .push_bind(&input.description)
            .push(", status = COALESCE(")
            .push_bind(input.status.as_deref())
            .push(", status), due_date = ")
            .push_bind(input.due_date)
            .push(" WHERE id = ")
            .push_bind(id);
        push_scope(&mut qb, scope, true);

        Ok(qb.build().execute(self.pool).await?.rows_affected())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: TaskId, scope: Scope) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::new("DELETE FROM tasks WHERE id = ");
        qb.push_bind(id);
        push_scope(&mut qb, scope, true);

        Ok(qb.build().execute(self.pool).await?.rows_affected())
    }
}
