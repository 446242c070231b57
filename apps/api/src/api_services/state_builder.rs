use std::sync::Arc;

use congress_application::{
    AuthorizationRepository, AuthorizationService, RecordRepository, RecordService,
    SecurityAdminRepository, SecurityAdminService, UserRepository, UserService,
};
use congress_core::AppError;
use congress_infrastructure::{
    Argon2PasswordHasher, InMemoryRecordRepository, InMemorySecurityRepository,
    PostgresAuthorizationRepository, PostgresRecordRepository, PostgresSecurityAdminRepository,
    PostgresUserRepository,
};
use sqlx::PgPool;
use tracing::info;

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Port implementations backing one storage backend.
#[derive(Clone)]
pub struct Repositories {
    pub records: Arc<dyn RecordRepository>,
    pub authorization: Arc<dyn AuthorizationRepository>,
    pub security_admin: Arc<dyn SecurityAdminRepository>,
    pub users: Arc<dyn UserRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            records: Arc::new(PostgresRecordRepository::new(pool.clone())),
            authorization: Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
            security_admin: Arc::new(PostgresSecurityAdminRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        let security = Arc::new(InMemorySecurityRepository::new());
        Self {
            records: Arc::new(InMemoryRecordRepository::new()),
            authorization: security.clone(),
            security_admin: security.clone(),
            users: security,
        }
    }
}

pub fn build_app_state(config: &ApiConfig, repositories: Repositories) -> AppState {
    let authorization_service = AuthorizationService::new(
        repositories.authorization,
        config.default_roles.guest.as_str(),
    );

    AppState {
        record_service: RecordService::new(
            repositories.records,
            authorization_service.clone(),
            config.refine_options,
        ),
        security_admin_service: SecurityAdminService::new(
            repositories.security_admin.clone(),
            authorization_service.clone(),
        ),
        user_service: UserService::new(
            repositories.users,
            Arc::new(Argon2PasswordHasher::new()),
            repositories.security_admin,
            authorization_service.clone(),
            config.default_roles.user.as_str(),
        ),
        authorization_service,
        frontend_url: config.frontend_url.clone(),
    }
}

/// Registers catalog permissions, default roles and the optional admin account.
pub async fn bootstrap_security(state: &AppState, config: &ApiConfig) -> Result<(), AppError> {
    state
        .security_admin_service
        .bootstrap_defaults(&config.default_roles)
        .await?;

    if let Some(admin) = &config.bootstrap_admin {
        let user_id = state
            .user_service
            .ensure_user(
                admin.email.as_str(),
                None,
                admin.password.as_str(),
                config.default_roles.admin.as_str(),
            )
            .await?;
        info!(%user_id, email = %admin.email, "bootstrap administrator ensured");
    }

    Ok(())
}
