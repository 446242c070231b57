use std::str::FromStr;

use congress_core::{AppError, AppResult};

use crate::permission::{Action, PermissionString};

/// A protected resource and the actions it declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDefinition {
    name: &'static str,
    extra_actions: &'static [&'static str],
}

impl ResourceDefinition {
    const fn new(name: &'static str, extra_actions: &'static [&'static str]) -> Self {
        Self {
            name,
            extra_actions,
        }
    }

    /// Returns the resource name used in permission strings.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns resource-specific actions outside the hierarchy.
    #[must_use]
    pub fn extra_actions(&self) -> &'static [&'static str] {
        self.extra_actions
    }

    /// Returns whether the resource declares the action.
    #[must_use]
    pub fn declares(&self, action: &str) -> bool {
        Action::from_str(action).is_ok() || self.extra_actions.contains(&action)
    }

    /// Returns every permission name declared by the resource.
    #[must_use]
    pub fn permission_names(&self) -> Vec<String> {
        Action::all()
            .iter()
            .map(Action::as_str)
            .chain(self.extra_actions.iter().copied())
            .map(|action| format!("{}:{action}", self.name))
            .collect()
    }
}

const RESOURCE_CATALOG: &[ResourceDefinition] = &[
    ResourceDefinition::new("categories", &[]),
    ResourceDefinition::new("companies", &[]),
    ResourceDefinition::new("companyemployees", &[]),
    ResourceDefinition::new("contacts", &[]),
    ResourceDefinition::new("countries", &[]),
    ResourceDefinition::new("events", &["participate", "listall", "publish"]),
    ResourceDefinition::new("eventtypes", &[]),
    ResourceDefinition::new("files", &[]),
    ResourceDefinition::new("locations", &[]),
    ResourceDefinition::new("locationtypes", &[]),
    ResourceDefinition::new("permissions", &[]),
    ResourceDefinition::new("programs", &[]),
    ResourceDefinition::new("rolepermissions", &[]),
    ResourceDefinition::new("roles", &[]),
    ResourceDefinition::new("sessions", &[]),
    ResourceDefinition::new("userpermissions", &[]),
    ResourceDefinition::new("userroles", &[]),
    ResourceDefinition::new("users", &["changepassword", "showme"]),
];

/// Static registry of every protected resource.
pub struct ResourceCatalog;

impl ResourceCatalog {
    /// Returns all registered resources.
    #[must_use]
    pub fn resources() -> &'static [ResourceDefinition] {
        RESOURCE_CATALOG
    }

    /// Finds a resource by name.
    #[must_use]
    pub fn find(name: &str) -> Option<&'static ResourceDefinition> {
        RESOURCE_CATALOG
            .iter()
            .find(|resource| resource.name == name)
    }

    /// Parses a permission name and checks it against the catalog.
    pub fn validate(name: &str) -> AppResult<PermissionString> {
        let permission = PermissionString::from_str(name.trim())?;
        let resource = Self::find(permission.resource()).ok_or_else(|| {
            AppError::Validation(format!("unknown resource '{}'", permission.resource()))
        })?;

        if !resource.declares(permission.action()) {
            return Err(AppError::Validation(format!(
                "resource '{}' does not declare action '{}'",
                resource.name,
                permission.action()
            )));
        }

        Ok(permission)
    }

    /// Returns every declared permission name across all resources.
    #[must_use]
    pub fn all_permission_names() -> Vec<String> {
        RESOURCE_CATALOG
            .iter()
            .flat_map(ResourceDefinition::permission_names)
            .collect()
    }
}
