use congress_application::{
    AuthorizationRepository, CreateRoleInput, SecurityAdminRepository, UserRepository,
};
use congress_core::{AppError, UserId};
use congress_domain::ObjectPermission;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use super::PostgresSecurityAdminRepository;
use crate::{PostgresAuthorizationRepository, PostgresUserRepository};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres security admin tests: {error}");
    }

    Some(pool)
}

async fn create_user(pool: &PgPool) -> UserId {
    let email = format!("{}@example.org", Uuid::new_v4().simple());
    PostgresUserRepository::new(pool.clone())
        .create(&email, None, "$argon2id$placeholder")
        .await
        .unwrap_or_else(|error| panic!("failed to create test user: {error}"))
}

fn unique_role() -> String {
    format!("role_{}", Uuid::new_v4().simple())
}

#[tokio::test]
async fn role_grants_resolve_through_authorization_repository() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let admin = PostgresSecurityAdminRepository::new(pool.clone());
    let authorization = PostgresAuthorizationRepository::new(pool.clone());
    let user_id = create_user(&pool).await;
    let role = unique_role();

    assert!(admin.ensure_permission("events:list").await.is_ok());
    assert!(admin.ensure_permission("events:update").await.is_ok());
    let created = admin
        .create_role(CreateRoleInput {
            name: role.clone(),
            permissions: vec!["events:update".to_owned(), "events:list".to_owned()],
        })
        .await;
    assert!(matches!(created, Ok(ref role) if role.permissions == vec!["events:list", "events:update"]));

    assert!(admin.assign_role(user_id, &role).await.is_ok());
    assert!(admin.assign_role(user_id, &role).await.is_ok());

    let roles = authorization
        .list_role_names_for_user(user_id)
        .await
        .unwrap_or_default();
    let permissions = authorization
        .list_permissions_for_role(&role)
        .await
        .unwrap_or_default();
    assert_eq!(roles, vec![role.clone()]);
    assert_eq!(permissions, vec!["events:list", "events:update"]);

    assert!(admin.unassign_role(user_id, &role).await.is_ok());
    assert!(
        authorization
            .list_role_names_for_user(user_id)
            .await
            .is_ok_and(|roles| roles.is_empty())
    );
}

#[tokio::test]
async fn duplicates_conflict_and_missing_references_are_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let admin = PostgresSecurityAdminRepository::new(pool.clone());
    let role = unique_role();
    assert!(admin.ensure_role(&role).await.is_ok());
    assert!(admin.ensure_permission("events:show").await.is_ok());

    let duplicate_role = admin
        .create_role(CreateRoleInput {
            name: role.clone(),
            permissions: Vec::new(),
        })
        .await;
    let duplicate_permission = admin.create_permission("events:show").await;
    let unknown_permission = admin
        .grant_role_permission(&role, "events:does_not_exist")
        .await;
    let unknown_user = admin.assign_role(UserId::new(), &role).await;

    assert!(matches!(duplicate_role, Err(AppError::Conflict(_))));
    assert!(matches!(duplicate_permission, Err(AppError::Conflict(_))));
    assert!(matches!(unknown_permission, Err(AppError::NotFound(_))));
    assert!(matches!(unknown_user, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn object_permissions_are_upserted() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let admin = PostgresSecurityAdminRepository::new(pool.clone());
    let authorization = PostgresAuthorizationRepository::new(pool.clone());
    let user_id = create_user(&pool).await;

    for (can_update, can_delete) in [(true, false), (false, true)] {
        let grant = ObjectPermission::new(user_id, "events", "e-1", true, can_update, can_delete)
            .unwrap_or_else(|_| unreachable!());
        assert!(admin.save_object_permission(grant).await.is_ok());
    }

    let stored = authorization
        .find_object_permission(user_id, "events", "e-1")
        .await
        .unwrap_or_default();
    assert!(stored.is_some_and(|grant| !grant.can_update() && grant.can_delete()));

    assert!(admin.ensure_permission("contacts:list").await.is_ok());
    assert!(
        admin
            .grant_user_permission(user_id, "contacts:list")
            .await
            .is_ok()
    );
    assert_eq!(
        authorization
            .list_direct_permissions(user_id)
            .await
            .unwrap_or_default(),
        vec!["contacts:list"]
    );
}

#[tokio::test]
async fn revocations_and_role_deletion_cascade() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let admin = PostgresSecurityAdminRepository::new(pool.clone());
    let authorization = PostgresAuthorizationRepository::new(pool.clone());
    let user_id = create_user(&pool).await;
    let role = unique_role();

    assert!(admin.ensure_permission("sessions:update").await.is_ok());
    assert!(admin.ensure_role(&role).await.is_ok());
    assert!(admin.grant_role_permission(&role, "sessions:update").await.is_ok());
    assert!(admin.assign_role(user_id, &role).await.is_ok());
    assert!(admin.grant_user_permission(user_id, "sessions:update").await.is_ok());

    assert!(admin.revoke_role_permission(&role, "sessions:update").await.is_ok());
    assert!(admin.revoke_role_permission(&role, "sessions:update").await.is_ok());
    assert!(admin.revoke_user_permission(user_id, "sessions:update").await.is_ok());
    assert!(
        authorization
            .list_permissions_for_role(&role)
            .await
            .is_ok_and(|permissions| permissions.is_empty())
    );
    assert!(
        authorization
            .list_direct_permissions(user_id)
            .await
            .is_ok_and(|permissions| permissions.is_empty())
    );

    assert!(admin.delete_role(&role).await.is_ok());
    assert!(
        authorization
            .list_role_names_for_user(user_id)
            .await
            .is_ok_and(|roles| roles.is_empty())
    );
    assert!(matches!(
        admin.delete_role(&role).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        admin
            .delete_permission(&format!("{role}:list"))
            .await,
        Err(AppError::NotFound(_))
    ));
}
