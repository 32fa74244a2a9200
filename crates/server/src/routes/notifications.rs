//! The caller's own notification feed.

use axum::{Json, extract::State};
use tracing::instrument;

use crm_core::NotificationId;

use super::{MessageBody, message};
use crate::db::NotificationRepository;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::Notification;
use crate::policy::{Action, Resource, scope_for};
use crate::routes::extract::ApiPath;
use crate::state::AppState;

/// `GET /api/notifications`
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let scope = scope_for(Resource::Notification, Action::Read, &caller)?;
    Ok(Json(
        NotificationRepository::new(state.pool()).list(scope).await?,
    ))
}

/// `PUT /api/notifications/{id}` marks one notification read.
#[instrument(skip_all, fields(user_id = %caller.user_id, notification_id = %id))]
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<NotificationId>,
) -> Result<Json<MessageBody>, AppError> {
    let scope = scope_for(Resource::Notification, Action::Update, &caller)?;
    let changed = NotificationRepository::new(state.pool())
        .mark_read(id, scope)
        .await?;
    tracing::debug!(rows_affected = changed, "Notification marked read");

    Ok(message("Notification marked as read"))
}
