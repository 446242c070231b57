use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use congress_core::{AppError, AppResult, Principal, UserId, UserIdentity};
use congress_domain::ObjectPermission;

use crate::security_admin_ports::{CreateRoleInput, RoleDefinition, SecurityAdminRepository};
use crate::{AuthorizationRepository, AuthorizationService};

use super::{PasswordHasher, UserRecord, UserRepository, UserService};

#[derive(Default)]
struct FakeUserRepository {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

#[async_trait]
impl UserRepository for FakeUserRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        Ok(self.users.lock().await.get(&user_id).cloned())
    }

    async fn create(
        &self,
        email: &str,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> AppResult<UserId> {
        let user_id = UserId::new();
        self.users.lock().await.insert(
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
        if let Some(user) = self.users.lock().await.get_mut(&user_id) {
            user.password_hash = password_hash.to_owned();
        }
        Ok(())
    }

    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<()> {
        if let Some(user) = self.users.lock().await.get_mut(&user_id) {
            user.last_login = Some(at);
        }
        Ok(())
    }
}

#[derive(Default)]
struct CountingHasher {
    hashes: std::sync::atomic::AtomicUsize,
}

impl PasswordHasher for CountingHasher {
    fn hash_password(&self, password: &str) -> AppResult<String> {
        self.hashes
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(format!("hashed:{password}"))
    }

    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool> {
        Ok(hash == format!("hashed:{password}"))
    }
}

/// Grants live in one map keyed by user; role grants are fixed.
#[derive(Default)]
struct FakeGrants {
    assigned: Mutex<HashMap<UserId, HashSet<String>>>,
    direct: HashMap<UserId, Vec<String>>,
}

#[async_trait]
impl AuthorizationRepository for FakeGrants {
    async fn list_direct_permissions(&self, user_id: UserId) -> AppResult<Vec<String>> {
        Ok(self.direct.get(&user_id).cloned().unwrap_or_default())
    }

    async fn list_role_names_for_user(&self, user_id: UserId) -> AppResult<Vec<String>> {
        Ok(self
            .assigned
            .lock()
            .await
            .get(&user_id)
            .map(|roles| roles.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_permissions_for_role(&self, role_name: &str) -> AppResult<Vec<String>> {
        Ok(match role_name {
            "user" => vec!["users:changepassword".to_owned()],
            _ => Vec::new(),
        })
    }

    async fn find_object_permission(
        &self,
        _user_id: UserId,
        _resource: &str,
        _object_id: &str,
    ) -> AppResult<Option<ObjectPermission>> {
        Ok(None)
    }
}

#[async_trait]
impl SecurityAdminRepository for FakeGrants {
    async fn list_permissions(&self) -> AppResult<Vec<String>> {
        Ok(Vec::new())
    }

    async fn create_permission(&self, _name: &str) -> AppResult<()> {
        Ok(())
    }

    async fn ensure_permission(&self, _name: &str) -> AppResult<()> {
        Ok(())
    }

    async fn delete_permission(&self, _name: &str) -> AppResult<()> {
        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        Ok(Vec::new())
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        Ok(RoleDefinition {
            name: input.name,
            permissions: input.permissions,
        })
    }

    async fn ensure_role(&self, _name: &str) -> AppResult<()> {
        Ok(())
    }

    async fn delete_role(&self, _name: &str) -> AppResult<()> {
        Ok(())
    }

    async fn grant_role_permission(&self, _role_name: &str, _permission: &str) -> AppResult<()> {
        Ok(())
    }

    async fn revoke_role_permission(&self, _role_name: &str, _permission: &str) -> AppResult<()> {
        Ok(())
    }

    async fn assign_role(&self, user_id: UserId, role_name: &str) -> AppResult<()> {
        self.assigned
            .lock()
            .await
            .entry(user_id)
            .or_default()
            .insert(role_name.to_owned());
        Ok(())
    }

    async fn unassign_role(&self, user_id: UserId, role_name: &str) -> AppResult<()> {
        if let Some(roles) = self.assigned.lock().await.get_mut(&user_id) {
            roles.remove(role_name);
        }
        Ok(())
    }

    async fn grant_user_permission(&self, _user_id: UserId, _permission: &str) -> AppResult<()> {
        Ok(())
    }

    async fn revoke_user_permission(&self, _user_id: UserId, _permission: &str) -> AppResult<()> {
        Ok(())
    }

    async fn save_object_permission(&self, _grant: ObjectPermission) -> AppResult<()> {
        Ok(())
    }
}

struct Fixture {
    service: UserService,
    users: Arc<FakeUserRepository>,
    hasher: Arc<CountingHasher>,
    grants: Arc<FakeGrants>,
    admin: Principal,
}

fn fixture() -> Fixture {
    let admin_id = UserId::new();
    let mut grants = FakeGrants::default();
    grants.direct.insert(admin_id, vec!["users:create".to_owned()]);
    let grants = Arc::new(grants);
    let users = Arc::new(FakeUserRepository::default());
    let hasher = Arc::new(CountingHasher::default());
    let service = UserService::new(
        users.clone(),
        hasher.clone(),
        grants.clone(),
        AuthorizationService::new(grants.clone(), "guest"),
        "user",
    );

    Fixture {
        service,
        users,
        hasher,
        grants,
        admin: Principal::Authenticated(UserIdentity::new(
            admin_id,
            "admin@example.org",
            "Admin",
        )),
    }
}

#[tokio::test]
async fn registered_user_can_log_in_and_gets_default_role() {
    let fixture = fixture();

    let user = fixture
        .service
        .register_user(
            &fixture.admin,
            " Ada@Example.org ",
            Some("Ada Lovelace"),
            "analytical-engine",
        )
        .await
        .unwrap_or_else(|_| unreachable!());
    let identity = fixture
        .service
        .login("ada@example.org", "analytical-engine")
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(user.email, "ada@example.org");
    assert_eq!(identity.user_id(), user.id);
    assert_eq!(identity.display_name(), "Ada Lovelace");
    assert!(
        fixture
            .grants
            .assigned
            .lock()
            .await
            .get(&user.id)
            .is_some_and(|roles| roles.contains("user"))
    );
    let stored = fixture.users.find_by_id(user.id).await.unwrap_or_default();
    assert!(stored.is_some_and(|record| record.last_login.is_some()));
}

#[tokio::test]
async fn login_failures_share_one_error_and_always_hash() {
    let fixture = fixture();
    assert!(
        fixture
            .service
            .register_user(&fixture.admin, "grace@example.org", None, "cobol-compiler")
            .await
            .is_ok()
    );
    let hashes_before = fixture
        .hasher
        .hashes
        .load(std::sync::atomic::Ordering::SeqCst);

    let unknown = fixture
        .service
        .login("nobody@example.org", "cobol-compiler")
        .await;
    let wrong = fixture.service.login("grace@example.org", "fortran-77").await;

    let messages: Vec<String> = [unknown, wrong]
        .into_iter()
        .map(|result| match result {
            Err(AppError::Unauthorized(message)) => message,
            _ => String::new(),
        })
        .collect();
    assert_eq!(messages[0], "invalid email or password");
    assert_eq!(messages[0], messages[1]);
    assert_eq!(
        fixture
            .hasher
            .hashes
            .load(std::sync::atomic::Ordering::SeqCst),
        hashes_before + 1
    );
}

#[tokio::test]
async fn registration_requires_permission_and_rejects_duplicates() {
    let fixture = fixture();

    let as_guest = fixture
        .service
        .register_user(&Principal::Guest, "x@example.org", None, "long-enough-1")
        .await;
    let weak = fixture
        .service
        .register_user(&fixture.admin, "x@example.org", None, "password")
        .await;
    let first = fixture
        .service
        .register_user(&fixture.admin, "x@example.org", None, "long-enough-1")
        .await;
    let duplicate = fixture
        .service
        .register_user(&fixture.admin, "X@example.org", None, "long-enough-2")
        .await;

    assert!(matches!(as_guest, Err(AppError::Unauthorized(_))));
    assert!(matches!(weak, Err(AppError::Validation(_))));
    assert!(first.is_ok());
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn change_password_verifies_current_password() {
    let fixture = fixture();
    let user = fixture
        .service
        .register_user(&fixture.admin, "lin@example.org", None, "first-secret")
        .await
        .unwrap_or_else(|_| unreachable!());
    let member = Principal::Authenticated(user.identity());

    let wrong = fixture
        .service
        .change_password(&member, "not-the-secret", "second-secret")
        .await;
    let changed = fixture
        .service
        .change_password(&member, "first-secret", "second-secret")
        .await;

    assert!(matches!(wrong, Err(AppError::Unauthorized(_))));
    assert!(changed.is_ok());
    assert!(
        fixture
            .service
            .login("lin@example.org", "second-secret")
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn ensure_user_is_idempotent() {
    let fixture = fixture();

    let first = fixture
        .service
        .ensure_user("root@example.org", Some("Root"), "bootstrap-secret", "admin")
        .await
        .unwrap_or_else(|_| unreachable!());
    let second = fixture
        .service
        .ensure_user("root@example.org", Some("Root"), "other-secret", "admin")
        .await
        .unwrap_or_else(|_| unreachable!());

    assert_eq!(first, second);
    assert_eq!(fixture.users.users.lock().await.len(), 1);
    assert!(
        fixture
            .service
            .login("root@example.org", "bootstrap-secret")
            .await
            .is_ok()
    );
}
