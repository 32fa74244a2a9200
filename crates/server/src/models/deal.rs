//! Deals attached to a customer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crm_core::{CustomerId, DealId, UserId};

/// Stage given to deals created without one.
pub const DEFAULT_DEAL_STAGE: &str = "open";

/// Stage counted as won by the analytics aggregate.
pub const CLOSED_DEAL_STAGE: &str = "closed";

#[derive(Debug, Clone, Serialize)]
pub struct Deal {
    pub id: DealId,
    pub user_id: UserId,
    pub customer_id: CustomerId,
    pub title: String,
    pub amount: Decimal,
    pub stage: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DealInput {
    pub customer_id: CustomerId,
    pub title: String,
    /// Accepts a JSON number or a decimal string.
    pub amount: Decimal,
    #[serde(default)]
    pub stage: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_deal_amount_accepts_number_and_string() {
        let input: DealInput =
            serde_json::from_str(r#"{"customer_id":1,"title":"Renewal","amount":1250.5}"#).unwrap();
        assert_eq!(input.amount, Decimal::from_str("1250.5").unwrap());

        let input: DealInput =
            serde_json::from_str(r#"{"customer_id":1,"title":"Renewal","amount":"99.90"}"#)
                .unwrap();
        assert_eq!(input.amount, Decimal::from_str("99.90").unwrap());
    }

    #[test]
    fn test_deal_requires_customer() {
        assert!(serde_json::from_str::<DealInput>(r#"{"title":"x","amount":1}"#).is_err());
    }
}
