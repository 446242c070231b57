use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use congress_core::{AppError, AppResult, Principal, UserId};
use congress_domain::{
    Action, ObjectPermission, PermissionString, ResourceCatalog, ResourceDefinition,
};

use crate::refine::{PaginationWindow, RefinedPage, apply_pagination};
use crate::security_admin_ports::{CreateRoleInput, RoleDefinition, SecurityAdminRepository};
use crate::AuthorizationService;


/// Resources readable without an account.
const PUBLIC_RESOURCES: &[&str] = &[
    "categories",
    "countries",
    "events",
    "eventtypes",
    "locations",
    "locationtypes",
    "programs",
    "sessions",
];

/// Extra grants of every registered user on top of the guest grants.
const MEMBER_PERMISSIONS: &[&str] = &["events:participate", "users:showme", "users:changepassword"];

/// Names of the roles created on first start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRoles {
    /// Role whose grants apply to unauthenticated callers.
    pub guest: String,
    /// Role assigned to new accounts.
    pub user: String,
    /// Role holding every permission.
    pub admin: String,
}

/// Application service for permission and role administration.
#[derive(Clone)]
pub struct SecurityAdminService {
    repository: Arc<dyn SecurityAdminRepository>,
    authorization_service: AuthorizationService,
}

impl SecurityAdminService {
    /// Creates a security admin service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn SecurityAdminRepository>,
        authorization_service: AuthorizationService,
    ) -> Self {
        Self {
            repository,
            authorization_service,
        }
    }

    /// Lists registered permission names.
    pub async fn list_permissions(
        &self,
        actor: &Principal,
        name_contains: Option<&str>,
        window: PaginationWindow,
    ) -> AppResult<RefinedPage<String>> {
        self.require(actor, "permissions", Action::List).await?;

        let needle = name_contains.map(str::to_lowercase);
        let names: Vec<String> = self
            .repository
            .list_permissions()
            .await?
            .into_iter()
            .filter(|name| {
                needle
                    .as_deref()
                    .is_none_or(|needle| name.to_lowercase().contains(needle))
            })
            .collect();
        let (items, total) = apply_pagination(names, window);

        Ok(RefinedPage { items, total })
    }

    /// Registers a permission declared by the resource catalog.
    pub async fn create_permission(
        &self,
        actor: &Principal,
        name: &str,
    ) -> AppResult<PermissionString> {
        self.require(actor, "permissions", Action::Create).await?;

        let permission = ResourceCatalog::validate(name)?;
        self.repository
            .create_permission(&permission.to_string())
            .await?;
        info!(subject = %actor.subject(), permission = %permission, "permission created");

        Ok(permission)
    }

    /// Removes a permission together with every role and user grant of it.
    pub async fn delete_permission(&self, actor: &Principal, name: &str) -> AppResult<()> {
        self.require(actor, "permissions", Action::Delete).await?;
        self.repository.delete_permission(name).await?;
        info!(subject = %actor.subject(), permission = name, "permission deleted");
        Ok(())
    }

    /// Lists roles with their grants.
    pub async fn list_roles(&self, actor: &Principal) -> AppResult<Vec<RoleDefinition>> {
        self.require(actor, "roles", Action::List).await?;
        self.repository.list_roles().await
    }

    /// Creates a role with catalog-validated grants.
    pub async fn create_role(
        &self,
        actor: &Principal,
        input: CreateRoleInput,
    ) -> AppResult<RoleDefinition> {
        self.require(actor, "roles", Action::Create).await?;

        let name = input.name.trim().to_owned();
        if name.is_empty() {
            return Err(AppError::Validation(
                "role name must not be empty".to_owned(),
            ));
        }

        let permissions = input
            .permissions
            .iter()
            .map(|permission| ResourceCatalog::validate(permission).map(|parsed| parsed.to_string()))
            .collect::<AppResult<BTreeSet<_>>>()?;

        let role = self
            .repository
            .create_role(CreateRoleInput {
                name,
                permissions: permissions.into_iter().collect(),
            })
            .await?;
        info!(subject = %actor.subject(), role = %role.name, "role created");

        Ok(role)
    }

    /// Removes a role; its grants and user assignments go with it.
    pub async fn delete_role(&self, actor: &Principal, role_name: &str) -> AppResult<()> {
        self.require(actor, "roles", Action::Delete).await?;
        self.repository.delete_role(role_name).await?;
        info!(subject = %actor.subject(), role = role_name, "role deleted");
        Ok(())
    }

    /// Returns the permissions granted to one role.
    pub async fn role_permissions(
        &self,
        actor: &Principal,
        role_name: &str,
    ) -> AppResult<Vec<String>> {
        self.require(actor, "rolepermissions", Action::List).await?;

        self.repository
            .list_roles()
            .await?
            .into_iter()
            .find(|role| role.name == role_name)
            .map(|role| role.permissions)
            .ok_or_else(|| AppError::NotFound(format!("role '{role_name}' does not exist")))
    }

    /// Adds a catalog permission to an existing role.
    pub async fn grant_role_permission(
        &self,
        actor: &Principal,
        role_name: &str,
        permission: &str,
    ) -> AppResult<()> {
        self.require(actor, "rolepermissions", Action::Create).await?;

        let permission = ResourceCatalog::validate(permission)?;
        self.repository
            .grant_role_permission(role_name, &permission.to_string())
            .await?;
        info!(subject = %actor.subject(), role = role_name, permission = %permission, "role permission granted");

        Ok(())
    }

    /// Removes a permission from a role.
    pub async fn revoke_role_permission(
        &self,
        actor: &Principal,
        role_name: &str,
        permission: &str,
    ) -> AppResult<()> {
        self.require(actor, "rolepermissions", Action::Delete).await?;
        self.repository
            .revoke_role_permission(role_name, permission)
            .await?;
        info!(subject = %actor.subject(), role = role_name, permission, "role permission revoked");
        Ok(())
    }

    /// Assigns a role to a user.
    pub async fn assign_role(
        &self,
        actor: &Principal,
        user_id: UserId,
        role_name: &str,
    ) -> AppResult<()> {
        self.require(actor, "userroles", Action::Create).await?;
        self.repository.assign_role(user_id, role_name).await?;
        info!(subject = %actor.subject(), %user_id, role = role_name, "role assigned");
        Ok(())
    }

    /// Removes a role from a user.
    pub async fn unassign_role(
        &self,
        actor: &Principal,
        user_id: UserId,
        role_name: &str,
    ) -> AppResult<()> {
        self.require(actor, "userroles", Action::Delete).await?;
        self.repository.unassign_role(user_id, role_name).await?;
        info!(subject = %actor.subject(), %user_id, role = role_name, "role unassigned");
        Ok(())
    }

    /// Grants a permission directly to a user.
    pub async fn grant_user_permission(
        &self,
        actor: &Principal,
        user_id: UserId,
        permission: &str,
    ) -> AppResult<()> {
        self.require(actor, "userpermissions", Action::Create).await?;

        let permission = ResourceCatalog::validate(permission)?;
        self.repository
            .grant_user_permission(user_id, &permission.to_string())
            .await?;
        info!(subject = %actor.subject(), %user_id, permission = %permission, "permission granted");

        Ok(())
    }

    /// Removes a direct grant from a user; role grants are unaffected.
    pub async fn revoke_user_permission(
        &self,
        actor: &Principal,
        user_id: UserId,
        permission: &str,
    ) -> AppResult<()> {
        self.require(actor, "userpermissions", Action::Delete).await?;
        self.repository
            .revoke_user_permission(user_id, permission)
            .await?;
        info!(subject = %actor.subject(), %user_id, permission, "permission revoked");
        Ok(())
    }

    /// Stores an item-level grant.
    pub async fn save_object_permission(
        &self,
        actor: &Principal,
        grant: ObjectPermission,
    ) -> AppResult<()> {
        self.require(actor, "userpermissions", Action::Update).await?;

        if ResourceCatalog::find(grant.resource()).is_none() {
            return Err(AppError::Validation(format!(
                "unknown resource '{}'",
                grant.resource()
            )));
        }

        info!(
            subject = %actor.subject(),
            user_id = %grant.user_id(),
            resource = grant.resource(),
            object_id = grant.object_id(),
            "object permission saved"
        );
        self.repository.save_object_permission(grant).await
    }

    /// Returns the effective permissions of another user.
    pub async fn user_permissions(
        &self,
        actor: &Principal,
        user_id: UserId,
    ) -> AppResult<BTreeSet<String>> {
        self.require(actor, "userpermissions", Action::List).await?;
        self.authorization_service
            .resolve_user_permissions(user_id)
            .await
    }

    /// Registers the catalog and the default roles; safe to run repeatedly.
    pub async fn bootstrap_defaults(&self, roles: &DefaultRoles) -> AppResult<()> {
        for name in ResourceCatalog::all_permission_names() {
            self.repository.ensure_permission(&name).await?;
        }

        for role_name in [&roles.guest, &roles.user, &roles.admin] {
            self.repository.ensure_role(role_name).await?;
        }

        let public_reads: Vec<String> = PUBLIC_RESOURCES
            .iter()
            .flat_map(|resource| {
                [Action::List, Action::Show]
                    .into_iter()
                    .map(move |action| format!("{resource}:{action}"))
            })
            .collect();

        for permission in &public_reads {
            self.repository
                .grant_role_permission(&roles.guest, permission)
                .await?;
            self.repository
                .grant_role_permission(&roles.user, permission)
                .await?;
        }

        for permission in MEMBER_PERMISSIONS {
            self.repository
                .grant_role_permission(&roles.user, permission)
                .await?;
        }

        for permission in ResourceCatalog::resources()
            .iter()
            .flat_map(admin_permissions)
        {
            self.repository
                .grant_role_permission(&roles.admin, &permission)
                .await?;
        }

        info!(
            guest = %roles.guest,
            user = %roles.user,
            admin = %roles.admin,
            "default roles ensured"
        );

        Ok(())
    }

    async fn require(&self, actor: &Principal, resource: &str, action: Action) -> AppResult<()> {
        let required = PermissionString::for_action(resource, action)?;
        self.authorization_service
            .require_permission(actor, &required)
            .await
    }
}

fn admin_permissions(resource: &ResourceDefinition) -> Vec<String> {
    std::iter::once(Action::Manage.as_str())
        .chain(resource.extra_actions().iter().copied())
        .map(|action| format!("{}:{action}", resource.name()))
        .collect()
}
