use serde::Serialize;
use ts_rs::TS;

mod auth;
mod records;
mod security;

pub use auth::{
    ChangePasswordRequest, LoginRequest, MeResponse, RegisterUserRequest, UserIdentityResponse,
};
pub use records::{QueryConditionRequest, QueryRecordsRequest, QuerySortRequest};
pub use security::{
    AssignRoleRequest, CreatePermissionRequest, CreateRoleRequest, GrantRolePermissionRequest,
    GrantUserPermissionRequest, PermissionListQuery, PermissionResponse, RoleResponse,
    SaveObjectPermissionRequest,
};

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}
