//! Task CRUD.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crm_core::TaskId;

use super::{MessageBody, customers, message};
use crate::db::TaskRepository;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Task, TaskInput};
use crate::policy::{Action, Resource, scope_for};
use crate::routes::extract::{ApiJson, ApiPath};
use crate::services::NotificationMessage;
use crate::state::AppState;

/// `GET /api/tasks`
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Task>>, AppError> {
    let scope = scope_for(Resource::Task, Action::Read, &caller)?;
    Ok(Json(TaskRepository::new(state.pool()).list(scope).await?))
}

/// `POST /api/tasks`
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(input): ApiJson<TaskInput>,
) -> Result<(StatusCode, Json<MessageBody>), AppError> {
    let scope = scope_for(Resource::Task, Action::Create, &caller)?;
    if let Some(customer_id) = input.customer_id {
        customers::ensure_visible(&state, &caller, customer_id).await?;
    }
    let owner = scope.owner().unwrap_or(caller.user_id);

    let task = TaskRepository::new(state.pool())
        .create(owner, &input)
        .await?;
    tracing::info!(task_id = %task.id, "Task created");

    state
        .notifier()
        .notify(
            caller.user_id,
            NotificationMessage::TaskCreated { title: &task.title },
        )
        .await;

    Ok((StatusCode::CREATED, message("Task added")))
}

/// `PUT /api/tasks/{id}`
#[instrument(skip_all, fields(user_id = %caller.user_id, task_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<TaskId>,
    ApiJson(input): ApiJson<TaskInput>,
) -> Result<Json<MessageBody>, AppError> {
    let scope = scope_for(Resource::Task, Action::Update, &caller)?;
    if let Some(customer_id) = input.customer_id {
        customers::ensure_visible(&state, &caller, customer_id).await?;
    }
    let changed = TaskRepository::new(state.pool())
        .update(id, scope, &input)
        .await?;
    tracing::debug!(rows_affected = changed, "Task update applied");

    Ok(message("Task updated"))
}

/// `DELETE /api/tasks/{id}`
#[instrument(skip_all, fields(user_id = %caller.user_id, task_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<MessageBody>, AppError> {
    let scope = scope_for(Resource::Task, Action::Delete, &caller)?;
    let changed = TaskRepository::new(state.pool())
        .delete(id, scope)
        .await?;
    tracing::debug!(rows_affected = changed, "Task delete applied");

    Ok(message("Task deleted"))
}
