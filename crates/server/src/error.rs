//! Unified error handling for the API.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::policy::AccessDenied;
use crate::services::{PasswordError, TokenError};

/// Application-level error type.
///
/// Renders as `{"error": "<message>"}`.
#[derive(Debug, Error)]
pub enum AppError {
    /// No bearer credential was presented.
    #[error("Unauthorized")]
    Unauthorized,

    /// A credential was presented but is wrong, expired or tampered with.
    #[error("{0}")]
    InvalidCredential(String),

    /// The caller is authenticated but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("{0}")]
    Validation(String),

    /// A store operation failed.
    #[error("{0}")]
    Persistence(#[from] RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredential(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::Validation(_) | Self::Persistence(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Persistence(_) | Self::Internal(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request failed"
            );
        }

        let status = self.status();
        let message = match &self {
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<AccessDenied> for AppError {
    fn from(denied: AccessDenied) -> Self {
        Self::Forbidden(denied.to_string())
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired | TokenError::Invalid => {
                Self::InvalidCredential("Invalid token".to_string())
            }
            TokenError::Encode(e) => Self::Internal(e.to_string()),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Mismatch | PasswordError::MalformedHash => {
                Self::InvalidCredential("Invalid credentials".to_string())
            }
            PasswordError::Hash => Self::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: i32) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crm_core::Role;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(get_status(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            get_status(AppError::InvalidCredential("x".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("x".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Validation("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Persistence(RepositoryError::NotFound)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("x".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let (status, body) = body_json(AppError::Unauthorized).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Unauthorized"}));
    }

    #[tokio::test]
    async fn test_persistence_error_surfaces_message() {
        let err = AppError::Persistence(RepositoryError::Conflict("email already exists".into()));
        let (_, body) = body_json(err).await;
        assert_eq!(body["error"], "constraint violation: email already exists");
    }

    #[tokio::test]
    async fn test_internal_error_is_hidden() {
        let (_, body) = body_json(AppError::Internal("pool exploded".into())).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[test]
    fn test_conversions() {
        let denied = AccessDenied::RoleRequired {
            required: Role::Premium,
        };
        assert!(matches!(AppError::from(denied), AppError::Forbidden(_)));
        assert!(matches!(
            AppError::from(TokenError::Expired),
            AppError::InvalidCredential(ref m) if m == "Invalid token"
        ));
        assert!(matches!(
            AppError::from(PasswordError::Mismatch),
            AppError::InvalidCredential(ref m) if m == "Invalid credentials"
        ));
        assert!(matches!(
            AppError::from(PasswordError::Hash),
            AppError::Internal(_)
        ));
    }
}
