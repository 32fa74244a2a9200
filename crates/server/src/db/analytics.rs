//! Analytics aggregate over a single owner's rows.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crm_core::UserId;

use super::RepositoryError;
use crate::models::AnalyticsSummary;
use crate::models::deal::CLOSED_DEAL_STAGE;
use crate::models::task::COMPLETED_TASK_STATUS;

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    total_customers: i64,
    completed_tasks: i64,
    closed_deals: i64,
    total_deal_amount: Decimal,
}

pub struct AnalyticsRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AnalyticsRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count `owner`'s customers, completed tasks and closed deals.
    ///
    /// Always scoped to `owner`, whatever the caller's role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary(&self, owner: UserId) -> Result<AnalyticsSummary, RepositoryError> {
        let row = sqlx::query_as::<_, SummaryRow>(
            r"
            SELECT
                (SELECT COUNT(*) FROM customers WHERE user_id = $1) AS total_customers,
                (SELECT COUNT(*) FROM tasks WHERE user_id = $1 AND status = $2) AS completed_tasks,
                (SELECT COUNT(*) FROM deals WHERE user_id = $1 AND stage = $3) AS closed_deals,
                (SELECT COALESCE(SUM(amount), 0) FROM deals
                    WHERE user_id = $1 AND stage = $3) AS total_deal_amount
            ",
        )
        .bind(owner)
        .bind(COMPLETED_TASK_STATUS)
        .bind(CLOSED_DEAL_STAGE)
        .fetch_one(self.pool)
        .await?;

        Ok(AnalyticsSummary {
            total_customers: row.total_customers,
            completed_tasks: row.completed_tasks,
            closed_deals: row.closed_deals,
            total_deal_amount: row.total_deal_amount,
        })
    }
}
