use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use congress_core::{AppResult, Principal, UserId};
use congress_domain::{Decision, ObjectAction, ObjectPermission, PermissionString};


/// Repository port for grant lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists permission names granted directly to a user.
    async fn list_direct_permissions(&self, user_id: UserId) -> AppResult<Vec<String>>;

    /// Lists the names of the roles a user holds.
    async fn list_role_names_for_user(&self, user_id: UserId) -> AppResult<Vec<String>>;

    /// Lists permission names granted to a role.
    async fn list_permissions_for_role(&self, role_name: &str) -> AppResult<Vec<String>>;

    /// Finds the item-level grant of a user for one object.
    async fn find_object_permission(
        &self,
        user_id: UserId,
        resource: &str,
        object_id: &str,
    ) -> AppResult<Option<ObjectPermission>>;
}

/// Application service resolving effective permissions and decisions.
///
/// Grants are read fresh for every check; nothing is cached.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
    guest_role_name: String,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(
        repository: Arc<dyn AuthorizationRepository>,
        guest_role_name: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            guest_role_name: guest_role_name.into(),
        }
    }

    /// Returns the role whose grants apply to unauthenticated callers.
    #[must_use]
    pub fn guest_role_name(&self) -> &str {
        self.guest_role_name.as_str()
    }

    /// Resolves the deduplicated permission names of a principal.
    ///
    /// Guests get the guest role's grants; users get direct grants plus the
    /// grants of every role they hold.
    pub async fn resolve_effective_permissions(
        &self,
        principal: &Principal,
    ) -> AppResult<BTreeSet<String>> {
        let Some(identity) = principal.identity() else {
            return Ok(self
                .repository
                .list_permissions_for_role(&self.guest_role_name)
                .await?
                .into_iter()
                .collect());
        };

        self.resolve_user_permissions(identity.user_id()).await
    }

    /// Resolves direct and role grants of one user account.
    pub async fn resolve_user_permissions(&self, user_id: UserId) -> AppResult<BTreeSet<String>> {
        let mut permissions: BTreeSet<String> = self
            .repository
            .list_direct_permissions(user_id)
            .await?
            .into_iter()
            .collect();

        for role_name in self.repository.list_role_names_for_user(user_id).await? {
            permissions.extend(self.repository.list_permissions_for_role(&role_name).await?);
        }

        Ok(permissions)
    }

    /// Decides whether the principal holds the required permission.
    pub async fn authorize(
        &self,
        principal: &Principal,
        required: &PermissionString,
    ) -> AppResult<Decision> {
        let permissions = self.resolve_effective_permissions(principal).await?;
        let decision = Decision::evaluate(
            principal.is_guest(),
            permissions.iter().map(String::as_str),
            required,
        );

        if !decision.is_allowed() {
            debug!(subject = %principal.subject(), permission = %required, "permission denied");
        }

        Ok(decision)
    }

    /// Decides an item-level operation.
    ///
    /// A coarse denial is overridden for authenticated users when an object
    /// grant for the same item allows the show/update/delete action.
    pub async fn authorize_object(
        &self,
        principal: &Principal,
        required: &PermissionString,
        object_id: &str,
    ) -> AppResult<Decision> {
        let decision = self.authorize(principal, required).await?;
        if decision.is_allowed() {
            return Ok(decision);
        }

        let (Some(identity), Some(action)) =
            (principal.identity(), ObjectAction::from_action(required.action()))
        else {
            return Ok(decision);
        };

        let grant = self
            .repository
            .find_object_permission(identity.user_id(), required.resource(), object_id)
            .await?;

        if grant.is_some_and(|grant| grant.allows(action)) {
            debug!(
                subject = %principal.subject(),
                permission = %required,
                object_id,
                "object permission override"
            );
            return Ok(Decision::Allow);
        }

        Ok(decision)
    }

    /// Returns whether the principal holds the permission.
    pub async fn has_permission(
        &self,
        principal: &Principal,
        required: &PermissionString,
    ) -> AppResult<bool> {
        Ok(self.authorize(principal, required).await?.is_allowed())
    }

    /// Ensures the principal holds the permission.
    pub async fn require_permission(
        &self,
        principal: &Principal,
        required: &PermissionString,
    ) -> AppResult<()> {
        self.authorize(principal, required)
            .await?
            .into_result(principal.subject(), required)
    }

    /// Ensures the principal may act on one item.
    pub async fn require_object_permission(
        &self,
        principal: &Principal,
        required: &PermissionString,
        object_id: &str,
    ) -> AppResult<()> {
        self.authorize_object(principal, required, object_id)
            .await?
            .into_result(principal.subject(), required)
    }
}
