/// Authentication token endpoints
///
/// # Endpoints
///
/// - `POST /v1/tokens/authentication` - Log in, returns a bearer token
/// - `DELETE /v1/tokens/authentication` - Revoke all of the caller's tokens

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use listkeeper_shared::{
    auth::{middleware::CurrentUser, password::verify_dummy, token::SCOPE_AUTHENTICATION},
    models::{token::Token, user::User},
};
use serde::Deserialize;
use validator::Validate;

/// Same message for unknown user and wrong password
const INVALID_CREDENTIALS: &str = "Invalid authentication credentials";

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username
    #[validate(length(min = 1, max = 50, message = "Username must be between 1 and 50 characters"))]
    pub username: String,

    /// Password
    #[validate(length(min = 1, max = 128, message = "Password must be between 1 and 128 characters"))]
    pub password: String,
}

/// Log in with username and password
///
/// # Endpoint
///
/// ```text
/// POST /v1/tokens/authentication
/// Content-Type: application/json
///
/// { "username": "alice", "password": "correct horse battery" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "token": "Q2x1c3RlcktleXNBcmVOb3RSZWFsbHk",
///   "expiry": "2025-01-02T12:00:00Z"
/// }
/// ```
///
/// # Errors
///
/// - `401 Unauthorized`: Unknown username or wrong password
/// - `422 Unprocessable Entity`: Validation failed
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Token>)> {
    let Json(req) = payload?;
    req.validate()?;

    let Some(user) = User::find_by_username(&state.db, &req.username).await? else {
        // Spend the same Argon2 work as a wrong password
        let password = req.password;
        tokio::task::spawn_blocking(move || verify_dummy(&password))
            .await
            .map_err(|e| ApiError::InternalError(format!("Verification task failed: {}", e)))?;

        tracing::debug!("Login attempt for unknown username");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    let hash = user.password_hash.clone();
    let password = req.password;
    let matches = tokio::task::spawn_blocking(move || hash.matches(&password))
        .await
        .map_err(|e| ApiError::InternalError(format!("Verification task failed: {}", e)))??;

    if !matches {
        tracing::info!(user_id = user.id, "Login failed: wrong password");
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    let token = Token::create(
        &state.db,
        user.id,
        state.config.auth.token_ttl(),
        SCOPE_AUTHENTICATION,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(token)))
}

/// Revoke every authentication token of the current user
///
/// Includes the token used for this request.
pub async fn logout_all(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<StatusCode> {
    Token::revoke_all(&state.db, user.id, SCOPE_AUTHENTICATION).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_validation() {
        let req = LoginRequest {
            username: "alice".to_string(),
            password: "x".to_string(),
        };
        assert!(req.validate().is_ok());

        let req = LoginRequest {
            username: String::new(),
            password: String::new(),
        };
        assert!(req.validate().is_err());
    }
}
