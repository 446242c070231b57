use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use congress_application::{
    AuthorizationRepository, CreateRoleInput, RoleDefinition, SecurityAdminRepository,
    UserRecord, UserRepository,
};
use congress_core::{AppError, AppResult, UserId};
use congress_domain::ObjectPermission;

#[derive(Debug, Default)]
struct SecurityState {
    users: HashMap<UserId, UserRecord>,
    permissions: BTreeSet<String>,
    roles: BTreeMap<String, BTreeSet<String>>,
    user_roles: HashMap<UserId, BTreeSet<String>>,
    user_permissions: HashMap<UserId, BTreeSet<String>>,
    object_permissions: HashMap<(UserId, String, String), ObjectPermission>,
}

impl SecurityState {
    fn require_user(&self, user_id: UserId) -> AppResult<()> {
        if self.users.contains_key(&user_id) {
            return Ok(());
        }
        Err(AppError::NotFound(format!("user '{user_id}' does not exist")))
    }

    fn require_role(&self, role_name: &str) -> AppResult<()> {
        if self.roles.contains_key(role_name) {
            return Ok(());
        }
        Err(AppError::NotFound(format!(
            "role '{role_name}' does not exist"
        )))
    }

    fn require_permission(&self, permission: &str) -> AppResult<()> {
        if self.permissions.contains(permission) {
            return Ok(());
        }
        Err(AppError::NotFound(format!(
            "permission '{permission}' is not registered"
        )))
    }
}

/// In-memory users, roles and grants behind all security ports.
///
/// Enforces the same referential rules as the relational schema.
#[derive(Debug, Default)]
pub struct InMemorySecurityRepository {
    state: RwLock<SecurityState>,
}

impl InMemorySecurityRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthorizationRepository for InMemorySecurityRepository {
    async fn list_direct_permissions(&self, user_id: UserId) -> AppResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .user_permissions
            .get(&user_id)
            .map(|permissions| permissions.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_role_names_for_user(&self, user_id: UserId) -> AppResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .user_roles
            .get(&user_id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_permissions_for_role(&self, role_name: &str) -> AppResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .get(role_name)
            .map(|permissions| permissions.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn find_object_permission(
        &self,
        user_id: UserId,
        resource: &str,
        object_id: &str,
    ) -> AppResult<Option<ObjectPermission>> {
        let state = self.state.read().await;
        Ok(state
            .object_permissions
            .get(&(user_id, resource.to_owned(), object_id.to_owned()))
            .cloned())
    }
}

#[async_trait]
impl SecurityAdminRepository for InMemorySecurityRepository {
    async fn list_permissions(&self) -> AppResult<Vec<String>> {
        Ok(self.state.read().await.permissions.iter().cloned().collect())
    }

    async fn create_permission(&self, name: &str) -> AppResult<()> {
        if !self.state.write().await.permissions.insert(name.to_owned()) {
            return Err(AppError::Conflict(format!(
                "permission '{name}' already exists"
            )));
        }
        Ok(())
    }

    async fn ensure_permission(&self, name: &str) -> AppResult<()> {
        self.state.write().await.permissions.insert(name.to_owned());
        Ok(())
    }

    async fn delete_permission(&self, name: &str) -> AppResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        state.require_permission(name)?;
        state.permissions.remove(name);
        for permissions in state
            .roles
            .values_mut()
            .chain(state.user_permissions.values_mut())
        {
            permissions.remove(name);
        }
        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let state = self.state.read().await;
        Ok(state
            .roles
            .iter()
            .map(|(name, permissions)| RoleDefinition {
                name: name.clone(),
                permissions: permissions.iter().cloned().collect(),
            })
            .collect())
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        let mut state = self.state.write().await;
        if state.roles.contains_key(&input.name) {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                input.name
            )));
        }
        for permission in &input.permissions {
            state.require_permission(permission)?;
        }

        let permissions: BTreeSet<String> = input.permissions.into_iter().collect();
        state.roles.insert(input.name.clone(), permissions.clone());

        Ok(RoleDefinition {
            name: input.name,
            permissions: permissions.into_iter().collect(),
        })
    }

    async fn ensure_role(&self, name: &str) -> AppResult<()> {
        self.state
            .write()
            .await
            .roles
            .entry(name.to_owned())
            .or_default();
        Ok(())
    }

    async fn delete_role(&self, name: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_role(name)?;
        state.roles.remove(name);
        for roles in state.user_roles.values_mut() {
            roles.remove(name);
        }
        Ok(())
    }

    async fn grant_role_permission(&self, role_name: &str, permission: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_permission(permission)?;
        state
            .roles
            .get_mut(role_name)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' does not exist")))?
            .insert(permission.to_owned());
        Ok(())
    }

    async fn revoke_role_permission(&self, role_name: &str, permission: &str) -> AppResult<()> {
        if let Some(permissions) = self.state.write().await.roles.get_mut(role_name) {
            permissions.remove(permission);
        }
        Ok(())
    }

    async fn assign_role(&self, user_id: UserId, role_name: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_user(user_id)?;
        state.require_role(role_name)?;
        state
            .user_roles
            .entry(user_id)
            .or_default()
            .insert(role_name.to_owned());
        Ok(())
    }

    async fn unassign_role(&self, user_id: UserId, role_name: &str) -> AppResult<()> {
        if let Some(roles) = self.state.write().await.user_roles.get_mut(&user_id) {
            roles.remove(role_name);
        }
        Ok(())
    }

    async fn grant_user_permission(&self, user_id: UserId, permission: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_user(user_id)?;
        state.require_permission(permission)?;
        state
            .user_permissions
            .entry(user_id)
            .or_default()
            .insert(permission.to_owned());
        Ok(())
    }

    async fn revoke_user_permission(&self, user_id: UserId, permission: &str) -> AppResult<()> {
        if let Some(permissions) = self.state.write().await.user_permissions.get_mut(&user_id) {
            permissions.remove(permission);
        }
        Ok(())
    }

    async fn save_object_permission(&self, grant: ObjectPermission) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_user(grant.user_id())?;
        let key = (
            grant.user_id(),
            grant.resource().to_owned(),
            grant.object_id().to_owned(),
        );
        state.object_permissions.insert(key, grant);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemorySecurityRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        let email = email.to_lowercase();
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|user| user.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn create(
        &self,
        email: &str,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> AppResult<UserId> {
        let mut state = self.state.write().await;
        let lowered = email.to_lowercase();
        if state
            .users
            .values()
            .any(|user| user.email.to_lowercase() == lowered)
        {
            return Err(AppError::Conflict(format!(
                "an account for '{email}' already exists"
            )));
        }

        let user_id = UserId::new();
        state.users.insert(
            user_id,
            UserRecord {
                id: user_id,
                email: email.to_owned(),
                full_name: full_name.map(str::to_owned),
                password_hash: password_hash.to_owned(),
                last_login: None,
            },
        );
        Ok(user_id)
    }

    async fn update_password(&self, user_id: UserId, password_hash: &str) -> AppResult<()> {
        let mut state = self.state.write().await;
        let user = state
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' does not exist")))?;
        user.password_hash = password_hash.to_owned();
        Ok(())
    }

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(user) = self.state.write().await.users.get_mut(&user_id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}
