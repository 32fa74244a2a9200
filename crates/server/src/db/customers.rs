//! Customer repository.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crm_core::{CustomerId, UserId};

use super::{RepositoryError, push_scope};
use crate::models::customer::normalize_interactions;
use crate::models::{Customer, CustomerInput};
use crate::policy::Scope;

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i32,
    user_id: i32,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    interactions: Json<Value>,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: CustomerId::new(row.id),
            user_id: UserId::new(row.user_id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            interactions: normalize_interactions(row.interactions.0),
            created_at: row.created_at,
        }
    }
}

const CUSTOMER_COLUMNS: &str = "id, user_id, name, email, phone, address, interactions, created_at";

pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List customers visible under `scope`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, scope: Scope) -> Result<Vec<Customer>, RepositoryError> {
        let mut qb = QueryBuilder::new(format!("SELECT {CUSTOMER_COLUMNS} FROM customers"));
        push_scope(&mut qb, scope, false);
        qb.push(" ORDER BY id");

        let rows = qb
            .build_query_as::<CustomerRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Whether customer `id` exists and is visible under `scope`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_visible(&self, id: CustomerId, scope: Scope) -> Result<bool, RepositoryError> {
        let visible = visible_query(id, scope)
            .build_query_scalar::<bool>()
            .fetch_one(self.pool)
            .await?;
        Ok(visible)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        owner: UserId,
        input: &CustomerInput,
    ) -> Result<Customer, RepositoryError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "INSERT INTO customers (user_id, name, email, phone, address, interactions) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {CUSTOMER_COLUMNS}"
        ))
        .bind(owner)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.address)
        .bind(Json(input.interactions()))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a customer's fields. Returns the number of rows changed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: CustomerId,
        scope: Scope,
        input: &CustomerInput,
    ) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::new("UPDATE customers SET name = ");
        qb.push_bind(&input.name)
            .push(", email = ")
            .push_bind(&input.email)
            .push(", phone = ")
            .push_bind(&input.phone)
            .push(", address = ")
            .push_bind(&input.address)
            .push(", interactions = ")
            .push_bind(Json(input.interactions()))
            .push(" WHERE id = ")
            .push_bind(id);
        push_scope(&mut qb, scope, true);

        Ok(qb.build().execute(self.pool).await?.rows_affected())
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: CustomerId, scope: Scope) -> Result<u64, RepositoryError> {
        let mut qb = QueryBuilder::new("DELETE FROM customers WHERE id = ");
        qb.push_bind(id);
        push_scope(&mut qb, scope, true);

        Ok(qb.build().execute(self.pool).await?.rows_affected())
    }
}

fn visible_query(id: CustomerId, scope: Scope) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT EXISTS (SELECT 1 FROM customers WHERE id = ");
    qb.push_bind(id);
    push_scope(&mut qb, scope, true);
    qb.push(")");
    qb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_is_owner_filtered() {
        let qb = visible_query(CustomerId::new(1), Scope::Owner(UserId::new(2)));
        assert_eq!(
            qb.sql(),
            "SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1 AND user_id = $2)"
        );
    }

    #[test]
    fn test_visibility_for_all_scope_checks_existence_only() {
        let qb = visible_query(CustomerId::new(1), Scope::All);
        assert_eq!(
            qb.sql(),
            "SELECT EXISTS (SELECT 1 FROM customers WHERE id = $1)"
        );
    }
}
