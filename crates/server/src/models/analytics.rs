//! Per-caller analytics aggregate.

use rust_decimal::Decimal;
use serde::Serialize;

/// Counts over the caller's own rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsSummary {
    pub total_customers: i64,
    /// Tasks whose status is `completed`.
    pub completed_tasks: i64,
    /// Deals whose stage is `closed`.
    pub closed_deals: i64,
    /// Sum of closed deal amounts, zero when there are none.
    pub total_deal_amount: Decimal,
}
