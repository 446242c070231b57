use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use congress_core::{AppError, Principal};
use congress_domain::PermissionString;
use tower_sessions::Session;
use tracing::info;

use crate::dto::{MeResponse, UserIdentityResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn logout_handler(
    Extension(principal): Extension<Principal>,
    session: Session,
) -> ApiResult<StatusCode> {
    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    if !principal.is_guest() {
        info!(subject = %principal.subject(), "logout");
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<MeResponse>> {
    if !principal.is_guest() {
        let show_me = PermissionString::new("users", "showme")?;
        state
            .authorization_service
            .require_permission(&principal, &show_me)
            .await?;
    }

    let permissions = state
        .authorization_service
        .resolve_effective_permissions(&principal)
        .await?;

    Ok(Json(MeResponse {
        authenticated: !principal.is_guest(),
        user: principal.identity().map(UserIdentityResponse::from),
        permissions: permissions.into_iter().collect(),
    }))
}
