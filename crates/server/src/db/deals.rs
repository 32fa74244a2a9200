//! Deal repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, QueryBuilder};

use crm_core::{CustomerId, DealId, UserId};

use super::{RepositoryError, push_scope};
use crate::models::deal::DEFAULT_DEAL_STAGE;
use crate::models::{Deal, DealInput};
use crate::policy::Scope;

#[derive(Debug, sqlx::FromRow)]
struct DealRow {
    id: i32,
    user_id: i32,
    customer_id: i32,
    title: String,
    amount: Decimal,
    stage: String,
    created_at: DateTime<Utc>,
}

impl From<DealRow> for Deal {
    fn from(row: DealRow) -> Self {
        Self {
            id: DealId::new(row.id),
            user_id: UserId::new(row.user_id),
            customer_id: CustomerId::new(row.customer_id),
            title: row.title,
            amount: row.amount,
            stage: row.stage,
            created_at: row.created_at,
        }
    }
}

const DEAL_COLUMNS: &str = "id, user_id, customer_id, title, amount, stage, created_at";

pub struct DealRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DealRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, scope: Scope) -> Result<Vec<Deal>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {DEAL_COLUMNS} FROM deals"));
        push_scope(&mut qb, scope, false);
        qb.push(" ORDER BY id");

        let rows = qb.build_query_as::<DealRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a deal owned by `owner`. A missing stage becomes `open`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails, including an
    /// unknown `customer_id`.
    pub async fn create(&self, owner: UserId, input: &DealInput) -> Result<Deal, RepositoryError> {
        let row = sqlx::query_as::<_, DealRow>(&format!(
            "INSERT INTO deals (user_id, customer_id, title, amount, stage) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {DEAL_COLUMNS}"
        ))
        .bind(owner)
        .bind(input.customer_id)
        .bind(&input.title)
        .bind(input.amount)
        .bind(input.stage.as_deref().unwrap_or(DEFAULT_DEAL_STAGE))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a deal's fields. A missing stage keeps the current one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: DealId,
        scope: Scope,
        input: &DealInput,
    ) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::new("UPDATE deals SET customer_id = ");
        qb.push_bind(input.customer_id)
            .push(", title = ")
            .push_bind(&input.title)
            .push(", amount = ")
            .push_bind(input.amount)
            .push(", stage = COALESCE(")
            .push_bind(input.stage.as_deref())
            .push(", stage) WHERE id = ")
            .push_bind(id);
        push_scope(&mut qb, scope, true);

        Ok(qb.build().execute(self.pool).await?.rows_affected())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: DealId, scope: Scope) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::new("DELETE FROM deals WHERE id = ");
        qb.push_bind(id);
        push_scope(&mut qb, scope, true);

        Ok(qb.build().execute(self.pool).await?.rows_affected())
    }
}
