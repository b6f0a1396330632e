/// User endpoints
///
/// # Endpoints
///
/// - `POST /v1/users` - Register a new user (public)
/// - `GET /v1/users/me` - Current user profile
/// - `PATCH /v1/users/me` - Update username, email or password
///
/// Changing the password revokes every authentication token of the user,
/// so all sessions (including the current one) must log in again.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use listkeeper_shared::{
    auth::{
        middleware::CurrentUser,
        password::{validate_password_strength, CredentialHash},
        token::SCOPE_AUTHENTICATION,
    },
    models::{
        token::Token,
        user::{CreateUser, UpdateUser, User},
    },
};
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Unique username
    #[validate(
        length(min = 1, max = 50, message = "Username must be between 1 and 50 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,
}

/// Profile update request; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMeRequest {
    /// New username
    #[validate(
        length(min = 1, max = 50, message = "Username must be between 1 and 50 characters"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,

    /// New email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// New password
    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: Option<String>,
}

/// Usernames are ASCII letters, digits, underscores and dashes
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid = username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if valid {
        Ok(())
    } else {
        let mut error = ValidationError::new("username_charset");
        error.message =
            Some("Username may only contain letters, digits, underscores and dashes".into());
        Err(error)
    }
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /v1/users
/// Content-Type: application/json
///
/// {
///   "username": "alice",
///   "email": "alice@example.com",
///   "password": "correct horse battery"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON
/// - `409 Conflict`: Username or email already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let Json(req) = payload?;
    req.validate()?;
    check_password_strength(&req.password)?;

    let password_hash = hash_password(req.password).await?;

    let user = User::create(
        &state.db,
        CreateUser {
            username: req.username,
            email: req.email,
            password_hash,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Current user profile
pub async fn me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

/// Update the current user's profile
///
/// # Errors
///
/// - `400 Bad Request`: Malformed JSON or no fields given
/// - `409 Conflict`: Username or email already taken
/// - `422 Unprocessable Entity`: Validation failed
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<UpdateMeRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(req) = payload?;
    req.validate()?;

    let password_hash = match req.password {
        Some(password) => {
            check_password_strength(&password)?;
            Some(hash_password(password).await?)
        }
        None => None,
    };

    let changes = UpdateUser {
        username: req.username,
        email: req.email,
        password_hash,
    };

    if changes.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one of username, email or password must be provided".to_string(),
        ));
    }

    let password_changed = changes.password_hash.is_some();

    // The new password and the session revocation commit together or not at all
    let mut tx = state.db.begin().await?;

    let updated = User::update_in(&mut *tx, user.id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if password_changed {
        Token::revoke_all_in(&mut *tx, user.id, SCOPE_AUTHENTICATION).await?;
    }

    tx.commit().await?;

    if password_changed {
        tracing::info!(user_id = user.id, "Password changed, sessions revoked");
    }

    Ok(Json(updated))
}

fn check_password_strength(password: &str) -> ApiResult<()> {
    validate_password_strength(password).map_err(|message| ApiError::invalid("password", message))
}

/// Argon2 is CPU-bound; keep it off the async workers
async fn hash_password(password: String) -> ApiResult<CredentialHash> {
    tokio::task::spawn_blocking(move || CredentialHash::set(&password))
        .await
        .map_err(|e| ApiError::InternalError(format!("Hashing task failed: {}", e)))?
        .map_err(ApiError::from)
}
