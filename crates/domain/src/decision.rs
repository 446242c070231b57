use congress_core::{AppError, AppResult, NonEmptyString, UserId};
use serde::{Deserialize, Serialize};

use crate::permission::{Action, PermissionString};

/// Why an authorization check was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Caller has no verified identity.
    Unauthenticated,
    /// Caller is known but lacks the permission.
    Forbidden,
}

impl DenyReason {
    /// Returns a stable transport value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
        }
    }
}

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    /// The operation may proceed.
    Allow,
    /// The operation is refused.
    Deny(DenyReason),
}

impl Decision {
    /// Decides a required permission against a resolved grant set.
    #[must_use]
    pub fn evaluate<'a>(
        is_guest: bool,
        granted: impl IntoIterator<Item = &'a str>,
        required: &PermissionString,
    ) -> Self {
        let allowed = granted.into_iter().any(|name| {
            PermissionString::parse(name).is_some_and(|granted| granted.covers(required))
        });

        if allowed {
            Self::Allow
        } else if is_guest {
            Self::Deny(DenyReason::Unauthenticated)
        } else {
            Self::Deny(DenyReason::Forbidden)
        }
    }

    /// Returns whether the decision allows the operation.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Converts a denial into the matching application error.
    pub fn into_result(self, subject: &str, required: &PermissionString) -> AppResult<()> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(DenyReason::Unauthenticated) => Err(AppError::Unauthorized(format!(
                "authentication required for '{required}'"
            ))),
            Self::Deny(DenyReason::Forbidden) => Err(AppError::Forbidden(format!(
                "subject '{subject}' is missing permission '{required}'"
            ))),
        }
    }
}

/// Item-level actions that object permissions can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectAction {
    /// Read one item.
    Show,
    /// Modify one item.
    Update,
    /// Remove one item.
    Delete,
}

impl ObjectAction {
    /// Maps a permission action onto an object action, if one applies.
    #[must_use]
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "show" => Some(Self::Show),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the hierarchical action this object action corresponds to.
    #[must_use]
    pub fn action(&self) -> Action {
        match self {
            Self::Show => Action::Show,
            Self::Update => Action::Update,
            Self::Delete => Action::Delete,
        }
    }
}

/// Per-item grant overriding coarse denials for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPermission {
    user_id: UserId,
    resource: NonEmptyString,
    object_id: NonEmptyString,
    can_show: bool,
    can_update: bool,
    can_delete: bool,
}

impl ObjectPermission {
    /// Creates a validated object permission.
    pub fn new(
        user_id: UserId,
        resource: impl Into<String>,
        object_id: impl Into<String>,
        can_show: bool,
        can_update: bool,
        can_delete: bool,
    ) -> AppResult<Self> {
        Ok(Self {
            user_id,
            resource: NonEmptyString::new(resource)?,
            object_id: NonEmptyString::new(object_id)?,
            can_show,
            can_update,
            can_delete,
        })
    }

    /// Returns the grantee.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the item identifier.
    #[must_use]
    pub fn object_id(&self) -> &str {
        self.object_id.as_str()
    }

    /// Returns the show flag.
    #[must_use]
    pub fn can_show(&self) -> bool {
        self.can_show
    }

    /// Returns the update flag.
    #[must_use]
    pub fn can_update(&self) -> bool {
        self.can_update
    }

    /// Returns the delete flag.
    #[must_use]
    pub fn can_delete(&self) -> bool {
        self.can_delete
    }

    /// Returns whether the grant allows the object action.
    #[must_use]
    pub fn allows(&self, action: ObjectAction) -> bool {
        match action {
            ObjectAction::Show => self.can_show,
            ObjectAction::Update => self.can_update,
            ObjectAction::Delete => self.can_delete,
        }
    }
}
