use serde::{Deserialize, Serialize};

use crate::UserId;

/// User information persisted in the authenticated session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    user_id: UserId,
    email: String,
    display_name: String,
}

impl UserIdentity {
    /// Creates a user identity from a verified account.
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            display_name: display_name.into(),
        }
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the login email of the account.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the display name for the current user.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}

/// The caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// No verified identity; carries only the configured guest role.
    Guest,
    /// A verified user account.
    Authenticated(UserIdentity),
}

impl Principal {
    /// Returns whether the caller is unauthenticated.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// Returns the verified identity, if any.
    #[must_use]
    pub fn identity(&self) -> Option<&UserIdentity> {
        match self {
            Self::Guest => None,
            Self::Authenticated(identity) => Some(identity),
        }
    }

    /// Returns a label suitable for log fields and error messages.
    #[must_use]
    pub fn subject(&self) -> &str {
        match self {
            Self::Guest => "guest",
            Self::Authenticated(identity) => identity.email(),
        }
    }
}

impl From<Option<UserIdentity>> for Principal {
    fn from(value: Option<UserIdentity>) -> Self {
        value.map_or(Self::Guest, Self::Authenticated)
    }
}

#[cfg(test)]
mod tests {
    use super::{Principal, UserIdentity};
    use crate::UserId;

    #[test]
    fn missing_identity_resolves_to_guest() {
        let principal = Principal::from(None);
        assert!(principal.is_guest());
        assert_eq!(principal.subject(), "guest");
    }

    #[test]
    fn authenticated_principal_exposes_identity() {
        let identity = UserIdentity::new(UserId::new(), "alice@example.com", "Alice");
        let principal = Principal::from(Some(identity.clone()));

        assert!(!principal.is_guest());
        assert_eq!(principal.identity(), Some(&identity));
        assert_eq!(principal.subject(), "alice@example.com");
    }
}
