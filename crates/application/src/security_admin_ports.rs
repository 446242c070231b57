use async_trait::async_trait;

use congress_core::{AppResult, UserId};
use congress_domain::ObjectPermission;

/// Role definition returned to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDefinition {
    /// Unique role name.
    pub name: String,
    /// Permission names granted to the role, sorted.
    pub permissions: Vec<String>,
}

/// Input payload for creating roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRoleInput {
    /// Unique role name.
    pub name: String,
    /// Permission names to attach to the role.
    pub permissions: Vec<String>,
}

/// Repository port for permission, role and grant administration.
#[async_trait]
pub trait SecurityAdminRepository: Send + Sync {
    /// Lists all registered permission names, sorted.
    async fn list_permissions(&self) -> AppResult<Vec<String>>;

    /// Registers a permission name; fails with a conflict when it exists.
    async fn create_permission(&self, name: &str) -> AppResult<()>;

    /// Registers a permission name unless it already exists.
    async fn ensure_permission(&self, name: &str) -> AppResult<()>;

    /// Removes a permission and every grant of it; fails when it is not registered.
    async fn delete_permission(&self, name: &str) -> AppResult<()>;

    /// Lists all roles with their grants.
    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>>;

    /// Creates a role; fails with a conflict when the name is taken.
    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition>;

    /// Creates a role without grants unless it already exists.
    async fn ensure_role(&self, name: &str) -> AppResult<()>;

    /// Removes a role with its grants and assignments; fails when it does not exist.
    async fn delete_role(&self, name: &str) -> AppResult<()>;

    /// Grants a registered permission to a role; idempotent.
    async fn grant_role_permission(&self, role_name: &str, permission: &str) -> AppResult<()>;

    /// Removes a permission from a role; idempotent.
    async fn revoke_role_permission(&self, role_name: &str, permission: &str) -> AppResult<()>;

    /// Assigns a role to a user; idempotent.
    async fn assign_role(&self, user_id: UserId, role_name: &str) -> AppResult<()>;

    /// Removes a role assignment from a user.
    async fn unassign_role(&self, user_id: UserId, role_name: &str) -> AppResult<()>;

    /// Grants a registered permission directly to a user; idempotent.
    async fn grant_user_permission(&self, user_id: UserId, permission: &str) -> AppResult<()>;

    /// Removes a direct grant from a user; idempotent.
    async fn revoke_user_permission(&self, user_id: UserId, permission: &str) -> AppResult<()>;

    /// Inserts or replaces the object permission for one user and item.
    async fn save_object_permission(&self, grant: ObjectPermission) -> AppResult<()>;
}
