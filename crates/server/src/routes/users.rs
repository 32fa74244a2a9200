//! User registration, login, promo upgrade and role administration.

use axum::{Json, extract::State, http::HeaderMap, http::StatusCode};
use tracing::instrument;

use crm_core::{Email, Role, UserId};

use super::{MessageBody, message};
use crate::db::{RepositoryError, UserRepository};
use crate::error::AppError;
use crate::middleware::{AuthUser, authenticate};
use crate::models::{
    Identity, LoginInput, LoginResponse, RegisterInput, RoleUpdateInput, UpgradeInput, User,
};
use crate::policy::{self, Feature};
use crate::routes::extract::{ApiJson, ApiPath};
use crate::services::{NotificationMessage, hash_password, verify_password};
use crate::state::AppState;

/// Promo codes that upgrade an account to premium.
pub const PROMO_CODES: &[&str] = &["PROMO2025", "FREEPREMIUM"];

/// `POST /api/users/register`
///
/// Registering an admin requires an admin bearer token on the same request.
#[instrument(skip_all, fields(email = %input.email))]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(input): ApiJson<RegisterInput>,
) -> Result<(StatusCode, Json<MessageBody>), AppError> {
    let role = input.role.unwrap_or_default();
    if role == Role::Admin {
        let requester = authenticate(&headers, state.tokens()).ok();
        let allowed = requester
            .is_some_and(|caller| policy::require(Feature::CreateAdmin, caller.role).is_ok());
        if !allowed {
            return Err(AppError::Forbidden(
                "Only admins can create admin accounts".to_string(),
            ));
        }
    }

    let email = Email::parse(&input.email).map_err(|e| AppError::Validation(e.to_string()))?;
    if input.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }

    let password = input.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let user = UserRepository::new(state.pool())
        .create(&email, &password_hash, &input.name, role)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(msg) => AppError::Validation(msg),
            other => AppError::Persistence(other),
        })?;

    tracing::info!(user_id = %user.id, role = %user.role, "User registered");

    if let Some(mailer) = state.email().cloned() {
        tokio::spawn(async move {
            if let Err(e) = mailer
                .send_welcome_email(user.email.as_str(), &user.name)
                .await
            {
                tracing::warn!(user_id = %user.id, error = %e, "Failed to send welcome email");
            }
        });
    }

    Ok((StatusCode::CREATED, message("User registered")))
}

/// `POST /api/users/login`
#[instrument(skip_all, fields(email = %input.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<LoginInput>,
) -> Result<Json<LoginResponse>, AppError> {
    let not_found = || AppError::NotFound("User not found".to_string());

    let email = Email::parse(&input.email).map_err(|_| not_found())?;
    let stored = UserRepository::new(state.pool())
        .get_credentials(&email)
        .await?
        .ok_or_else(not_found)?;

    let password = input.password;
    let hash = stored.password_hash;
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let user = stored.user;
    let token = state.tokens().issue(Identity {
        user_id: user.id,
        role: user.role,
    })?;

    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(LoginResponse { token, user }))
}

/// `POST /api/users/upgrade`
///
/// Trusts the `userId` in the body; the caller is not authenticated.
#[instrument(skip_all, fields(user_id = %input.user_id))]
pub async fn upgrade(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UpgradeInput>,
) -> Result<Json<MessageBody>, AppError> {
    if !PROMO_CODES.contains(&input.promo_code.as_str()) {
        return Err(AppError::Validation("Invalid promo code".to_string()));
    }

    let changed = UserRepository::new(state.pool())
        .update_role(input.user_id, Role::Premium)
        .await?;
    tracing::debug!(rows_affected = changed, "Promo upgrade applied");

    if changed > 0 {
        state
            .notifier()
            .notify(input.user_id, NotificationMessage::PremiumUpgrade)
            .await;
    }

    Ok(message("Account upgraded to Premium"))
}

/// `GET /api/users/me`
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn me(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<User>, AppError> {
    UserRepository::new(state.pool())
        .get_by_id(caller.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// `GET /api/users` (admin only)
#[instrument(skip_all, fields(user_id = %caller.user_id))]
pub async fn list(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    policy::require(Feature::ManageUsers, caller.role)?;
    let users = UserRepository::new(state.pool()).list_all().await?;
    Ok(Json(users))
}

/// `PUT /api/users/{id}/role` (admin only)
#[instrument(skip_all, fields(user_id = %caller.user_id, target = %id))]
pub async fn update_role(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(input): ApiJson<RoleUpdateInput>,
) -> Result<Json<MessageBody>, AppError> {
    policy::require(Feature::ManageUsers, caller.role)?;
    let role: Role = input
        .role
        .parse()
        .map_err(|e: crm_core::RoleParseError| AppError::Validation(e.to_string()))?;

    let changed = UserRepository::new(state.pool())
        .update_role(id, role)
        .await?;
    tracing::debug!(rows_affected = changed, role = %role, "Role updated");

    if changed > 0 {
        state
            .notifier()
            .notify(id, NotificationMessage::RoleChanged { role })
            .await;
    }

    Ok(message("Role updated"))
}
