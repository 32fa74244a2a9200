//! Deal CRUD.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crm_core::DealId;

use super::{MessageBody, customers, message};
use crate::db::DealRepository;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Deal, DealInput};
use crate::policy::{Action, Resource, scope_for};
use crate::routes::extract::{ApiJson, ApiPath};
use crate::services::NotificationMessage;
use crate::state::AppState;

/// `GET /api/deals`
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Deal>>, AppError> {
    let scope = scope_for(Resource::Deal, Action::Read, &caller)?;
    Ok(Json(DealRepository::new(state.pool()).list(scope).await?))
}

/// `POST /api/deals`
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(input): ApiJson<DealInput>,
) -> Result<(StatusCode, Json<MessageBody>), AppError> {
    let scope = scope_for(Resource::Deal, Action::Create, &caller)?;
    customers::ensure_visible(&state, &caller, input.customer_id).await?;
    let owner = scope.owner().unwrap_or(caller.user_id);

    let deal = DealRepository::new(state.pool())
        .create(owner, &input)
        .await?;
    tracing::info!(deal_id = %deal.id, amount = %deal.amount, "Deal created");

    state
        .notifier()
        .notify(
            caller.user_id,
            NotificationMessage::DealCreated { title: &deal.title },
        )
        .await;

    Ok((StatusCode::CREATED, message("Deal added")))
}

/// `PUT /api/deals/{id}`
#[instrument(skip_all, fields(user_id = %caller.user_id, deal_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<DealId>,
    ApiJson(input): ApiJson<DealInput>,
) -> Result<Json<MessageBody>, AppError> {
    let scope = scope_for(Resource::Deal, Action::Update, &caller)?;
    customers::ensure_visible(&state, &caller, input.customer_id).await?;
    let changed = DealRepository::new(state.pool())
        .update(id, scope, &input)
        .await?;
    tracing::debug!(rows_affected = changed, "Deal update applied");

    Ok(message("Deal updated"))
}

/// `DELETE /api/deals/{id}`
#[instrument(skip_all, fields(user_id = %caller.user_id, deal_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<DealId>,
) -> Result<Json<MessageBody>, AppError> {
    let scope = scope_for(Resource::Deal, Action::Delete, &caller)?;
    let changed = DealRepository::new(state.pool())
        .delete(id, scope)
        .await?;
    tracing::debug!(rows_affected = changed, "Deal delete applied");

    Ok(message("Deal deleted"))
}
