use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use congress_application::AuthorizationRepository;
use congress_core::{AppError, AppResult, UserId};
use congress_domain::ObjectPermission;

/// PostgreSQL-backed repository for grant lookups.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ObjectPermissionRow {
    resource: String,
    object_id: String,
    can_show: bool,
    can_update: bool,
    can_delete: bool,
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_direct_permissions(&self, user_id: UserId) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT permission
            FROM user_permissions
            WHERE user_id = $1
            ORDER BY permission
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load direct permissions for user '{user_id}': {error}"
            ))
        })
    }

    async fn list_role_names_for_user(&self, user_id: UserId) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT role_name
            FROM user_roles
            WHERE user_id = $1
            ORDER BY role_name
            "#,
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load roles for user '{user_id}': {error}"
            ))
        })
    }

    async fn list_permissions_for_role(&self, role_name: &str) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>(
            r#"
            SELECT permission
            FROM role_permissions
            WHERE role_name = $1
            ORDER BY permission
            "#,
        )
        .bind(role_name)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load permissions for role '{role_name}': {error}"
            ))
        })
    }

    async fn find_object_permission(
        &self,
        user_id: UserId,
        resource: &str,
        object_id: &str,
    ) -> AppResult<Option<ObjectPermission>> {
        let row = sqlx::query_as::<_, ObjectPermissionRow>(
            r#"
            SELECT resource, object_id, can_show, can_update, can_delete
            FROM object_permissions
            WHERE user_id = $1 AND resource = $2 AND object_id = $3
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(resource)
        .bind(object_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load object permission: {error}"))
        })?;

        row.map(|row| {
            ObjectPermission::new(
                user_id,
                row.resource,
                row.object_id,
                row.can_show,
                row.can_update,
                row.can_delete,
            )
        })
        .transpose()
    }
}
