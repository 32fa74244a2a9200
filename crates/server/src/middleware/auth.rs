//! Bearer credential verification.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};

use crate::error::{AppError, set_sentry_user};
use crate::models::Identity;
use crate::services::{TokenService, bearer_token};
use crate::state::AppState;

/// Extractor that requires a valid bearer token.
///
/// Rejects with `AppError::Unauthorized` when no `Bearer` header is present
/// and `AppError::InvalidCredential` when the token does not verify.
///
/// ```rust,ignore
/// async fn handler(AuthUser(caller): AuthUser) -> impl IntoResponse {
///     format!("Hello, user {}!", caller.user_id)
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Identity);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        authenticate(&parts.headers, state.tokens()).map(Self)
    }
}

/// Verify the bearer token in `headers`.
///
/// # Errors
///
/// Returns `AppError::Unauthorized` if there is no bearer token, or
/// `AppError::InvalidCredential` if it fails verification.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<Identity, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let identity = tokens.verify(token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::from(e)
    })?;

    set_sentry_user(identity.user_id.as_i32());
    Ok(identity)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{HeaderValue, header::AUTHORIZATION};
    use crm_core::{Role, UserId};
    use secrecy::SecretString;

    use super::*;

    fn tokens() -> TokenService {
        TokenService::new(&SecretString::from("k3#Vq9!mZ2@rT7$wX4%nB8^cL1&yH6*d"))
    }

    #[test]
    fn test_missing_header_is_unauthorized() {
        let result = authenticate(&HeaderMap::new(), &tokens());
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_bad_token_is_invalid_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer not.a.token"));
        let result = authenticate(&headers, &tokens());
        assert!(matches!(result, Err(AppError::InvalidCredential(_))));
    }

    #[test]
    fn test_valid_token_yields_identity() {
        let tokens = tokens();
        let caller = Identity {
            user_id: UserId::new(8),
            role: Role::Admin,
        };
        let token = tokens.issue(caller).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(authenticate(&headers, &tokens).unwrap(), caller);
    }
}
