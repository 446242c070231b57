use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use congress_application::{CreateRoleInput, PaginationWindow};
use congress_core::{Principal, UserId};
use congress_domain::ObjectPermission;

use crate::dto::{
    AssignRoleRequest, CreatePermissionRequest, CreateRoleRequest, GrantRolePermissionRequest,
    GrantUserPermissionRequest, PermissionListQuery, PermissionResponse, RoleResponse,
    SaveObjectPermissionRequest,
};
use crate::error::ApiResult;
use crate::handlers::total_count_headers;
use crate::state::AppState;


pub async fn list_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(query): Query<PermissionListQuery>,
) -> ApiResult<(HeaderMap, Json<Vec<PermissionResponse>>)> {
    let window =
        PaginationWindow::from_params(query.start, query.end, query.current_page, query.page_size);
    let page = state
        .security_admin_service
        .list_permissions(&principal, query.q.as_deref(), window)
        .await?;

    let items = page
        .items
        .into_iter()
        .map(|name| PermissionResponse { name })
        .collect();

    Ok((total_count_headers(page.total), Json(items)))
}

pub async fn create_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreatePermissionRequest>,
) -> ApiResult<(StatusCode, Json<PermissionResponse>)> {
    let permission = state
        .security_admin_service
        .create_permission(&principal, &payload.name)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(PermissionResponse {
            name: permission.to_string(),
        }),
    ))
}

pub async fn delete_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(permission): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .delete_permission(&principal, permission.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .security_admin_service
        .list_roles(&principal)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let role = state
        .security_admin_service
        .create_role(
            &principal,
            CreateRoleInput {
                name: payload.name,
                permissions: payload.permissions,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_name): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .delete_role(&principal, role_name.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_role_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_name): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let permissions = state
        .security_admin_service
        .role_permissions(&principal, role_name.as_str())
        .await?;

    Ok(Json(permissions))
}

pub async fn grant_role_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(role_name): Path<String>,
    Json(payload): Json<GrantRolePermissionRequest>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .grant_role_permission(&principal, role_name.as_str(), payload.permission.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_role_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((role_name, permission)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .security_admin_service
        .revoke_role_permission(&principal, role_name.as_str(), permission.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn assign_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
    Json(payload): Json<AssignRoleRequest>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::parse(&user_id)?;
    state
        .security_admin_service
        .assign_role(&principal, user_id, payload.role_name.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unassign_role_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((user_id, role_name)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::parse(&user_id)?;
    state
        .security_admin_service
        .unassign_role(&principal, user_id, role_name.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_user_permissions_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let user_id = UserId::parse(&user_id)?;
    let permissions = state
        .security_admin_service
        .user_permissions(&principal, user_id)
        .await?;

    Ok(Json(permissions.into_iter().collect()))
}

pub async fn grant_user_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
    Json(payload): Json<GrantUserPermissionRequest>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::parse(&user_id)?;
    state
        .security_admin_service
        .grant_user_permission(&principal, user_id, payload.permission.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_user_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((user_id, permission)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let user_id = UserId::parse(&user_id)?;
    state
        .security_admin_service
        .revoke_user_permission(&principal, user_id, permission.as_str())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn save_object_permission_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(user_id): Path<String>,
    Json(payload): Json<SaveObjectPermissionRequest>,
) -> ApiResult<StatusCode> {
    let grant = ObjectPermission::new(
        UserId::parse(&user_id)?,
        payload.resource,
        payload.object_id,
        payload.can_show,
        payload.can_update,
        payload.can_delete,
    )?;

    state
        .security_admin_service
        .save_object_permission(&principal, grant)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
