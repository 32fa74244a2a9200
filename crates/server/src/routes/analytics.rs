//! Premium analytics.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::AnalyticsRepository;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::AnalyticsSummary;
use crate::policy::{self, Feature};
use crate::state::AppState;

/// `GET /api/advanced-analytics`
///
/// Premium only. Counts cover the caller's own rows even for admins.
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<AnalyticsSummary>, AppError> {
    policy::require(Feature::AdvancedAnalytics, caller.role)?;
    let summary = AnalyticsRepository::new(state.pool())
        .summary(caller.user_id)
        .await?;
    Ok(Json(summary))
}
