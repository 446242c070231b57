use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use congress_application::{CreateRoleInput, RoleDefinition, SecurityAdminRepository};
use congress_core::{AppError, AppResult, UserId};
use congress_domain::ObjectPermission;

#[cfg(test)]
mod tests;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// PostgreSQL-backed repository for permission and role administration.
#[derive(Clone)]
pub struct PostgresSecurityAdminRepository {
    pool: PgPool,
}

impl PostgresSecurityAdminRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    role_name: String,
    permission: Option<String>,
}

fn database_code(error: &sqlx::Error) -> Option<String> {
    match error {
        sqlx::Error::Database(database_error) => {
            database_error.code().map(|code| code.into_owned())
        }
        _ => None,
    }
}

fn map_missing_reference(error: sqlx::Error, context: String) -> AppError {
    if database_code(&error).as_deref() == Some(FOREIGN_KEY_VIOLATION) {
        return AppError::NotFound(context);
    }

    AppError::Internal(format!("failed to store grant: {error}"))
}

#[async_trait]
impl SecurityAdminRepository for PostgresSecurityAdminRepository {
    async fn list_permissions(&self) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT name FROM permissions ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to list permissions: {error}")))
    }

    async fn create_permission(&self, name: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO permissions (name) VALUES ($1)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                if database_code(&error).as_deref() == Some(UNIQUE_VIOLATION) {
                    return AppError::Conflict(format!("permission '{name}' already exists"));
                }
                AppError::Internal(format!("failed to create permission: {error}"))
            })?;

        Ok(())
    }

    async fn ensure_permission(&self, name: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO permissions (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to ensure permission '{name}': {error}"))
            })?;

        Ok(())
    }

    async fn delete_permission(&self, name: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM permissions WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete permission '{name}': {error}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "permission '{name}' is not registered"
            )));
        }

        Ok(())
    }

    async fn list_roles(&self) -> AppResult<Vec<RoleDefinition>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT roles.name AS role_name, grants.permission
            FROM roles
            LEFT JOIN role_permissions AS grants
                ON grants.role_name = roles.name
            ORDER BY roles.name, grants.permission
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        let mut roles: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for row in rows {
            let permissions = roles.entry(row.role_name).or_default();
            if let Some(permission) = row.permission {
                permissions.push(permission);
            }
        }

        Ok(roles
            .into_iter()
            .map(|(name, permissions)| RoleDefinition { name, permissions })
            .collect())
    }

    async fn create_role(&self, input: CreateRoleInput) -> AppResult<RoleDefinition> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query("INSERT INTO roles (name) VALUES ($1)")
            .bind(input.name.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                if database_code(&error).as_deref() == Some(UNIQUE_VIOLATION) {
                    return AppError::Conflict(format!("role '{}' already exists", input.name));
                }
                AppError::Internal(format!("failed to create role: {error}"))
            })?;

        for permission in &input.permissions {
            sqlx::query(
                r#"
                INSERT INTO role_permissions (role_name, permission)
                VALUES ($1, $2)
                ON CONFLICT (role_name, permission) DO NOTHING
                "#,
            )
            .bind(input.name.as_str())
            .bind(permission.as_str())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                map_missing_reference(
                    error,
                    format!("permission '{permission}' is not registered"),
                )
            })?;
        }

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        let mut permissions = input.permissions;
        permissions.sort();
        permissions.dedup();

        Ok(RoleDefinition {
            name: input.name,
            permissions,
        })
    }

    async fn ensure_role(&self, name: &str) -> AppResult<()> {
        sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to ensure role '{name}': {error}")))?;

        Ok(())
    }

    async fn delete_role(&self, name: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM roles WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete role '{name}': {error}"))
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("role '{name}' does not exist")));
        }

        Ok(())
    }

    async fn grant_role_permission(&self, role_name: &str, permission: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO role_permissions (role_name, permission)
            VALUES ($1, $2)
            ON CONFLICT (role_name, permission) DO NOTHING
            "#,
        )
        .bind(role_name)
        .bind(permission)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_missing_reference(
                error,
                format!("role '{role_name}' or permission '{permission}' does not exist"),
            )
        })?;

        Ok(())
    }

    async fn revoke_role_permission(&self, role_name: &str, permission: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM role_permissions WHERE role_name = $1 AND permission = $2")
            .bind(role_name)
            .bind(permission)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to revoke '{permission}' from role '{role_name}': {error}"
                ))
            })?;

        Ok(())
    }

    async fn assign_role(&self, user_id: UserId, role_name: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_name)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role_name) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(role_name)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_missing_reference(
                error,
                format!("user '{user_id}' or role '{role_name}' does not exist"),
            )
        })?;

        Ok(())
    }

    async fn unassign_role(&self, user_id: UserId, role_name: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_name = $2")
            .bind(user_id.as_uuid())
            .bind(role_name)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to unassign role '{role_name}': {error}"))
            })?;

        Ok(())
    }

    async fn grant_user_permission(&self, user_id: UserId, permission: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO user_permissions (user_id, permission)
            VALUES ($1, $2)
            ON CONFLICT (user_id, permission) DO NOTHING
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(permission)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_missing_reference(
                error,
                format!("user '{user_id}' or permission '{permission}' does not exist"),
            )
        })?;

        Ok(())
    }

    async fn revoke_user_permission(&self, user_id: UserId, permission: &str) -> AppResult<()> {
        sqlx::query("DELETE FROM user_permissions WHERE user_id = $1 AND permission = $2")
            .bind(user_id.as_uuid())
            .bind(permission)
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to revoke '{permission}' from user '{user_id}': {error}"
                ))
            })?;

        Ok(())
    }

    async fn save_object_permission(&self, grant: ObjectPermission) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO object_permissions
                (user_id, resource, object_id, can_show, can_update, can_delete)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, resource, object_id) DO UPDATE
            SET can_show = EXCLUDED.can_show,
                can_update = EXCLUDED.can_update,
                can_delete = EXCLUDED.can_delete
            "#,
        )
        .bind(grant.user_id().as_uuid())
        .bind(grant.resource())
        .bind(grant.object_id())
        .bind(grant.can_show())
        .bind(grant.can_update())
        .bind(grant.can_delete())
        .execute(&self.pool)
        .await
        .map_err(|error| {
            map_missing_reference(error, format!("user '{}' does not exist", grant.user_id()))
        })?;

        Ok(())
    }
}
