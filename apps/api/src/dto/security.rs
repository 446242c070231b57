use congress_application::RoleDefinition;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Query string of the permission listing.
#[derive(Debug, Default, Deserialize)]
pub struct PermissionListQuery {
    pub q: Option<String>,
    #[serde(rename = "_start")]
    pub start: Option<i64>,
    #[serde(rename = "_end")]
    pub end: Option<i64>,
    #[serde(rename = "currentPage")]
    pub current_page: Option<i64>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<i64>,
}

/// Incoming payload for permission registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-permission-request.ts"
)]
pub struct CreatePermissionRequest {
    pub name: String,
}

/// API representation of a registered permission.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/permission-response.ts"
)]
pub struct PermissionResponse {
    pub name: String,
}

/// Incoming payload for custom role creation.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/create-role-request.ts"
)]
pub struct CreateRoleRequest {
    pub name: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// API representation of an RBAC role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub name: String,
    pub permissions: Vec<String>,
}

impl From<RoleDefinition> for RoleResponse {
    fn from(role: RoleDefinition) -> Self {
        Self {
            name: role.name,
            permissions: role.permissions,
        }
    }
}

/// Incoming payload for adding a permission to a role.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-role-permission-request.ts"
)]
pub struct GrantRolePermissionRequest {
    pub permission: String,
}

/// Incoming payload for role assignment.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/assign-role-request.ts"
)]
pub struct AssignRoleRequest {
    pub role_name: String,
}

/// Incoming payload for a direct user grant.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/grant-user-permission-request.ts"
)]
pub struct GrantUserPermissionRequest {
    pub permission: String,
}

/// Incoming payload for an item-level grant.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-object-permission-request.ts"
)]
pub struct SaveObjectPermissionRequest {
    pub resource: String,
    pub object_id: String,
    #[serde(default)]
    pub can_show: bool,
    #[serde(default)]
    pub can_update: bool,
    #[serde(default)]
    pub can_delete: bool,
}
