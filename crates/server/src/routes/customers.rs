//! Customer CRUD.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crm_core::CustomerId;

use super::{MessageBody, message};
use crate::db::CustomerRepository;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Customer, CustomerInput, Identity};
use crate::policy::{Action, Resource, scope_for};
use crate::routes::extract::{ApiJson, ApiPath};
use crate::services::NotificationMessage;
use crate::state::AppState;

/// `GET /api/customers`
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Customer>>, AppError> {
    let scope = scope_for(Resource::Customer, Action::Read, &caller)?;
    let customers = CustomerRepository::new(state.pool()).list(scope).await?;
    Ok(Json(customers))
}

/// `POST /api/customers`
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(input): ApiJson<CustomerInput>,
) -> Result<(StatusCode, Json<MessageBody>), AppError> {
    let scope = scope_for(Resource::Customer, Action::Create, &caller)?;
    let owner = scope.owner().unwrap_or(caller.user_id);

    let customer = CustomerRepository::new(state.pool())
        .create(owner, &input)
        .await?;
    tracing::info!(customer_id = %customer.id, "Customer created");

    state
        .notifier()
        .notify(
            caller.user_id,
            NotificationMessage::CustomerCreated {
                name: &customer.name,
            },
        )
        .await;

    Ok((StatusCode::CREATED, message("Customer added")))
}

/// `PUT /api/customers/{id}`
#[instrument(skip_all, fields(user_id = %caller.user_id, customer_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(input): ApiJson<CustomerInput>,
) -> Result<Json<MessageBody>, AppError> {
    let scope = scope_for(Resource::Customer, Action::Update, &caller)?;
    let changed = CustomerRepository::new(state.pool())
        .update(id, scope, &input)
        .await?;
    tracing::debug!(rows_affected = changed, "Customer update applied");

    state
        .notifier()
        .broadcast(
            caller.user_id,
            NotificationMessage::CustomerUpdated { name: &input.name },
        )
        .await;

    Ok(message("Customer updated"))
}

/// `DELETE /api/customers/{id}`
#[instrument(skip_all, fields(user_id = %caller.user_id, customer_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<MessageBody>, AppError> {
    let scope = scope_for(Resource::Customer, Action::Delete, &caller)?;
    let changed = CustomerRepository::new(state.pool())
        .delete(id, scope)
        .await?;
    tracing::debug!(rows_affected = changed, "Customer delete applied");

    state
        .notifier()
        .broadcast(caller.user_id, NotificationMessage::CustomerDeleted)
        .await;

    Ok(message("Customer deleted"))
}

/// Reject a `customer_id` the caller cannot read.
///
/// Tasks and deals may only reference customers visible to their creator;
/// unknown and foreign ids get the same answer.
pub(crate) async fn ensure_visible(
    state: &AppState,
    caller: &Identity,
    id: CustomerId,
) -> Result<(), AppError> {
    let scope = scope_for(Resource::Customer, Action::Read, caller)?;
    if CustomerRepository::new(state.pool())
        .is_visible(id, scope)
        .await?
    {
        Ok(())
    } else {
        Err(AppError::NotFound("Customer not found".to_string()))
    }
}
