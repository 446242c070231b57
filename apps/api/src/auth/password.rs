use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use congress_core::{AppError, Principal};
use tower_sessions::Session;
use tracing::{info, warn};

use crate::dto::{ChangePasswordRequest, LoginRequest, RegisterUserRequest, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

use super::SESSION_USER_KEY;

/// POST /auth/login - Verify email and password and start a session.
pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<UserIdentityResponse>> {
    let identity = match state
        .user_service
        .login(&payload.email, &payload.password)
        .await
    {
        Ok(identity) => identity,
        Err(error) => {
            if matches!(error, AppError::Unauthorized(_)) {
                warn!("login rejected");
            }
            return Err(error.into());
        }
    };

    // Regenerate the session id on privilege change.
    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to cycle session id: {error}")))?;

    session
        .insert(SESSION_USER_KEY, &identity)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist session identity: {error}"))
        })?;

    info!(subject = %identity.email(), "login");
    Ok(Json(UserIdentityResponse::from(&identity)))
}

/// POST /api/users - Create an account with the default user role.
pub async fn register_user_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<UserIdentityResponse>)> {
    let user = state
        .user_service
        .register_user(
            &principal,
            &payload.email,
            payload.full_name.as_deref(),
            &payload.password,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UserIdentityResponse::from(&user.identity())),
    ))
}

/// PUT /api/profile/password - Replace the caller's password.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    state
        .user_service
        .change_password(
            &principal,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
