//! Account credential rules.

use congress_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Lower-cased, structurally valid login email.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Requires a single `@`, a non-empty local part and a dotted domain.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let normalized = value.into().trim().to_lowercase();

        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain '@'".to_owned(),
            ));
        };

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.contains('@') || !domain.contains('.') || domain.starts_with('.') {
            return Err(AppError::Validation(format!(
                "email domain '{domain}' is invalid"
            )));
        }

        if normalized.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(normalized))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Shortest accepted password.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Longest accepted password; bounds hashing cost.
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Validates a plaintext password before it is hashed.
pub fn validate_password(password: &str) -> AppResult<()> {
    let length = password.chars().count();

    if length < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }

    if length > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "password must not exceed {PASSWORD_MAX_LENGTH} characters"
        )));
    }

    let lowered = password.to_lowercase();
    if WEAK_PASSWORDS.contains(&lowered.as_str()) {
        return Err(AppError::Validation(
            "password is too common".to_owned(),
        ));
    }

    Ok(())
}

static WEAK_PASSWORDS: &[&str] = &[
    "12345678",
    "123456789",
    "1234567890",
    "password",
    "password1",
    "password123",
    "qwertyuiop",
    "iloveyou",
    "sunshine",
    "football",
    "baseball",
    "welcome1",
    "letmein1",
    "trustno1",
    "congress",
];

#[cfg(test)]
mod tests {
    use super::{EmailAddress, PASSWORD_MAX_LENGTH, validate_password};

    #[test]
    fn email_is_trimmed_and_lowercased() {
        let email = EmailAddress::new("  Alice@Example.ORG ");
        assert!(matches!(email, Ok(value) if value.as_str() == "alice@example.org"));
    }

    #[test]
    fn malformed_emails_are_rejected() {
        assert!(EmailAddress::new("alice.example.org").is_err());
        assert!(EmailAddress::new("@example.org").is_err());
        assert!(EmailAddress::new("alice@localhost").is_err());
        assert!(EmailAddress::new("a@b@c.org").is_err());
    }

    #[test]
    fn short_and_common_passwords_are_rejected() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("Password123").is_err());
    }

    #[test]
    fn overlong_passwords_are_rejected() {
        assert!(validate_password(&"x".repeat(PASSWORD_MAX_LENGTH + 1)).is_err());
    }

    #[test]
    fn reasonable_password_is_accepted() {
        assert!(validate_password("correct horse battery").is_ok());
    }
}
