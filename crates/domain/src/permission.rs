use std::fmt::{Display, Formatter};
use std::str::FromStr;

use congress_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Hierarchical CRUD actions shared by every resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// List a collection.
    List,
    /// Read a single item.
    Show,
    /// Create an item.
    Create,
    /// Modify an item.
    Update,
    /// Remove an item.
    Delete,
    /// Full control over the resource.
    Manage,
}

impl Action {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Show => "show",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Manage => "manage",
        }
    }

    /// Returns all hierarchical actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Action] = &[
            Action::List,
            Action::Show,
            Action::Create,
            Action::Update,
            Action::Delete,
            Action::Manage,
        ];

        ALL
    }

    /// Returns the lesser actions granted implicitly by this action.
    ///
    /// The table is transitively closed, so a single lookup answers every
    /// implication question without walking the hierarchy.
    #[must_use]
    pub fn implied_actions(&self) -> &'static [Self] {
        match self {
            Self::Manage => &[
                Self::Delete,
                Self::Update,
                Self::Create,
                Self::Show,
                Self::List,
            ],
            Self::Delete => &[Self::Update, Self::Show, Self::List],
            Self::Update | Self::Create => &[Self::Show, Self::List],
            Self::Show => &[Self::List],
            Self::List => &[],
        }
    }

    /// Returns whether holding `self` is sufficient for `required`.
    #[must_use]
    pub fn implies(&self, required: Self) -> bool {
        *self == required || self.implied_actions().contains(&required)
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "list" => Ok(Self::List),
            "show" => Ok(Self::Show),
            "create" => Ok(Self::Create),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            "manage" => Ok(Self::Manage),
            _ => Err(AppError::Validation(format!("unknown action '{value}'"))),
        }
    }
}

impl Display for Action {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// A parsed `resource:action` permission name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionString {
    resource: String,
    action: String,
}

impl PermissionString {
    /// Creates a validated permission from its two parts.
    pub fn new(resource: impl Into<String>, action: impl Into<String>) -> AppResult<Self> {
        let resource = resource.into();
        let action = action.into();
        if !is_identifier(&resource) || !is_identifier(&action) {
            return Err(AppError::Validation(format!(
                "invalid permission '{resource}:{action}'"
            )));
        }

        Ok(Self { resource, action })
    }

    /// Builds the permission for a hierarchical action on a resource.
    pub fn for_action(resource: &str, action: Action) -> AppResult<Self> {
        Self::new(resource, action.as_str())
    }

    /// Parses `resource:action`, returning `None` for malformed names.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let (resource, action) = value.split_once(':')?;
        (is_identifier(resource) && is_identifier(action)).then(|| Self {
            resource: resource.to_owned(),
            action: action.to_owned(),
        })
    }

    /// Returns the resource part.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.resource.as_str()
    }

    /// Returns the action part.
    #[must_use]
    pub fn action(&self) -> &str {
        self.action.as_str()
    }

    /// Returns the hierarchical action, if the action part is one.
    #[must_use]
    pub fn hierarchical_action(&self) -> Option<Action> {
        Action::from_str(&self.action).ok()
    }

    /// Returns whether this grant covers the required permission.
    ///
    /// Resources must match exactly. Resource-specific actions only match
    /// themselves; hierarchical actions also match everything they imply.
    #[must_use]
    pub fn covers(&self, required: &Self) -> bool {
        if self.resource != required.resource {
            return false;
        }

        if self.action == required.action {
            return true;
        }

        match (self.hierarchical_action(), required.hierarchical_action()) {
            (Some(granted), Some(required)) => granted.implies(required),
            _ => false,
        }
    }
}

impl Display for PermissionString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}:{}", self.resource, self.action)
    }
}

impl FromStr for PermissionString {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
            .ok_or_else(|| AppError::Validation(format!("invalid permission '{value}'")))
    }
}

impl TryFrom<String> for PermissionString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl From<PermissionString> for String {
    fn from(value: PermissionString) -> Self {
        value.to_string()
    }
}

/// Returns whether a granted permission name satisfies a required one.
///
/// Fails closed: a malformed name on either side never satisfies.
#[must_use]
pub fn satisfies(granted: &str, required: &str) -> bool {
    match (PermissionString::parse(granted), PermissionString::parse(required)) {
        (Some(granted), Some(required)) => granted.covers(&required),
        _ => false,
    }
}

fn is_identifier(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|character| character.is_ascii_lowercase() || character.is_ascii_digit() || character == '_')
}
