//! Account ports and the login/registration service.
//!
//! Failed logins share one generic error so callers cannot tell which
//! email addresses hold accounts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use congress_core::{AppError, AppResult, Principal, UserId, UserIdentity};
use congress_domain::{Action, EmailAddress, PermissionString, validate_password};

use crate::{AuthorizationService, SecurityAdminRepository};

#[cfg(test)]
mod tests;

const INVALID_CREDENTIALS: &str = "invalid email or password";

/// User record returned by repository queries.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique user identifier.
    pub id: UserId,
    /// Canonical email address.
    pub email: String,
    /// Optional full name shown in the UI.
    pub full_name: Option<String>,
    /// Argon2id password hash.
    pub password_hash: String,
    /// Time of the last successful login.
    pub last_login: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Builds the session identity of this account.
    #[must_use]
    pub fn identity(&self) -> UserIdentity {
        let display_name = self
            .full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(self.email.as_str());

        UserIdentity::new(self.id, self.email.as_str(), display_name)
    }
}

/// Repository port for user persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by canonical email.
    async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>>;

    /// Finds a user by identifier.
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>>;

    /// Creates a user; fails with a conflict when the email is taken.
    async fn create(
        &self,
        email: &str,
        full_name: Option<&str>,
        password_hash: &str,
    ) -> AppResult<UserId>;

    /// Replaces the password hash of a user.
    async fn update_password(&self, user_id: UserId, password_hash: &str) -> AppResult<()>;

    /// Stores the time of a successful login.
    async fn record_login(&self, user_id: UserId, at: DateTime<Utc>) -> AppResult<()>;
}

/// Port for password hashing so the application layer stays free of
/// cryptographic crates.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Application service for authentication and account creation.
#[derive(Clone)]
pub struct UserService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    security_repository: Arc<dyn SecurityAdminRepository>,
    authorization_service: AuthorizationService,
    default_role_name: String,
}

impl UserService {
    /// Creates a user service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        security_repository: Arc<dyn SecurityAdminRepository>,
        authorization_service: AuthorizationService,
        default_role_name: impl Into<String>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            security_repository,
            authorization_service,
            default_role_name: default_role_name.into(),
        }
    }

    /// Authenticates with email and password.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<UserIdentity> {
        let Ok(email) = EmailAddress::new(email) else {
            let _ = self.password_hasher.hash_password(password);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        };

        let Some(user) = self.user_repository.find_by_email(email.as_str()).await? else {
            // Hash anyway so unknown accounts cost the same as known ones.
            let _ = self.password_hasher.hash_password(password);
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        };

        if !self
            .password_hasher
            .verify_password(password, &user.password_hash)?
        {
            warn!(user_id = %user.id, "login rejected");
            return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_owned()));
        }

        self.user_repository.record_login(user.id, Utc::now()).await?;
        info!(user_id = %user.id, "login succeeded");

        Ok(user.identity())
    }

    /// Creates an account and assigns the default user role.
    pub async fn register_user(
        &self,
        actor: &Principal,
        email: &str,
        full_name: Option<&str>,
        password: &str,
    ) -> AppResult<UserRecord> {
        let required = PermissionString::for_action("users", Action::Create)?;
        self.authorization_service
            .require_permission(actor, &required)
            .await?;

        let user = self
            .create_account(email, full_name, password, &self.default_role_name)
            .await?;
        info!(subject = %actor.subject(), user_id = %user.id, "user registered");

        Ok(user)
    }

    /// Changes the caller's own password.
    pub async fn change_password(
        &self,
        actor: &Principal,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let required = PermissionString::new("users", "changepassword")?;
        self.authorization_service
            .require_permission(actor, &required)
            .await?;

        let Some(identity) = actor.identity() else {
            return Err(AppError::Unauthorized(
                "authentication is required".to_owned(),
            ));
        };

        let user = self
            .user_repository
            .find_by_id(identity.user_id())
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_owned()))?;

        if !self
            .password_hasher
            .verify_password(current_password, &user.password_hash)?
        {
            return Err(AppError::Unauthorized(
                "current password is incorrect".to_owned(),
            ));
        }

        validate_password(new_password)?;
        let new_hash = self.password_hasher.hash_password(new_password)?;
        self.user_repository
            .update_password(user.id, &new_hash)
            .await?;
        info!(user_id = %user.id, "password changed");

        Ok(())
    }

    /// Creates the account unless the email exists, then assigns the role.
    ///
    /// System action used at startup; it bypasses permission checks.
    pub async fn ensure_user(
        &self,
        email: &str,
        full_name: Option<&str>,
        password: &str,
        role_name: &str,
    ) -> AppResult<UserId> {
        let canonical = EmailAddress::new(email)?;
        if let Some(existing) = self
            .user_repository
            .find_by_email(canonical.as_str())
            .await?
        {
            self.security_repository
                .assign_role(existing.id, role_name)
                .await?;
            return Ok(existing.id);
        }

        let user = self
            .create_account(email, full_name, password, role_name)
            .await?;
        info!(user_id = %user.id, role = role_name, "bootstrap user created");

        Ok(user.id)
    }

    /// Returns a user record by identifier.
    pub async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<UserRecord>> {
        self.user_repository.find_by_id(user_id).await
    }

    async fn create_account(
        &self,
        email: &str,
        full_name: Option<&str>,
        password: &str,
        role_name: &str,
    ) -> AppResult<UserRecord> {
        let email = EmailAddress::new(email)?;
        validate_password(password)?;

        if self
            .user_repository
            .find_by_email(email.as_str())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "an account for '{}' already exists",
                email.as_str()
            )));
        }

        let full_name = full_name.map(str::trim).filter(|name| !name.is_empty());
        let password_hash = self.password_hasher.hash_password(password)?;
        let user_id = self
            .user_repository
            .create(email.as_str(), full_name, &password_hash)
            .await?;
        self.security_repository
            .assign_role(user_id, role_name)
            .await?;

        Ok(UserRecord {
            id: user_id,
            email: email.as_str().to_owned(),
            full_name: full_name.map(str::to_owned),
            password_hash,
            last_login: None,
        })
    }
}
