//! Reports: list and create only.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use super::{MessageBody, message};
use crate::db::ReportRepository;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Report, ReportInput};
use crate::policy::{Action, Resource, scope_for};
use crate::routes::extract::ApiJson;
use crate::state::AppState;

/// `GET /api/reports`
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<Report>>, AppError> {
    let scope = scope_for(Resource::Report, Action::Read, &caller)?;
    Ok(Json(ReportRepository::new(state.pool()).list(scope).await?))
}

/// `POST /api/reports`. Creating a report sends no notification.
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn create(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiJson(input): ApiJson<ReportInput>,
) -> Result<(StatusCode, Json<MessageBody>), AppError> {
    let scope = scope_for(Resource::Report, Action::Create, &caller)?;
    let owner = scope.owner().unwrap_or(caller.user_id);

    let report = ReportRepository::new(state.pool())
        .create(owner, &input)
        .await?;
    tracing::info!(report_id = %report.id, "Report created");

    Ok((StatusCode::CREATED, message("Report added")))
}
