use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use congress_application::{DefaultRoles, RefineOptions};
use congress_core::AppError;
use congress_domain::{LogicalMode, TextMatchMode};
use tracing_subscriber::EnvFilter;

/// Where records, accounts and sessions are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::Validation(format!(
                "STORAGE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
            ))),
        }
    }
}

/// Administrator account ensured at startup.
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub default_roles: DefaultRoles,
    pub refine_options: RefineOptions,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(env::args().nth(1).as_deref(), |name| env::var(name).ok())
    }

    /// Builds the configuration from the first CLI argument and a variable lookup.
    pub fn from_lookup(
        command: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let migrate_only = command == Some("migrate");

        let storage_backend = lookup("STORAGE_BACKEND")
            .map(|value| value.parse::<StorageBackend>())
            .transpose()?
            .unwrap_or(StorageBackend::Postgres);

        let database_url = lookup("DATABASE_URL").filter(|value| !value.trim().is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(AppError::Validation("DATABASE_URL is required".to_owned()));
        }
        if migrate_only && storage_backend == StorageBackend::Memory {
            return Err(AppError::Validation(
                "migrate requires STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let frontend_url =
            lookup("FRONTEND_URL").unwrap_or_else(|| "http://localhost:3000".to_owned());
        let api_host = lookup("API_HOST").unwrap_or_else(|| "127.0.0.1".to_owned());
        let api_port = lookup("API_PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);
        let cookie_secure = lookup("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|| "false".to_owned())
            .eq_ignore_ascii_case("true");

        let default_roles = DefaultRoles {
            guest: role_name(&lookup, "GUEST_ROLE_NAME", "guest")?,
            user: role_name(&lookup, "USER_ROLE_NAME", "user")?,
            admin: role_name(&lookup, "ADMIN_ROLE_NAME", "admin")?,
        };

        let refine_options = RefineOptions {
            text_match: parse_optional::<TextMatchMode>(&lookup, "REFINE_TEXT_MATCH")?
                .unwrap_or_default(),
            same_operator_mode: parse_optional::<LogicalMode>(
                &lookup,
                "REFINE_SAME_OPERATOR_MODE",
            )?
            .unwrap_or_default(),
        };

        let bootstrap_admin = match (
            non_empty(&lookup, "BOOTSTRAP_ADMIN_EMAIL"),
            non_empty(&lookup, "BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "BOOTSTRAP_ADMIN_EMAIL and BOOTSTRAP_ADMIN_PASSWORD must be set together"
                        .to_owned(),
                ));
            }
        };

        Ok(Self {
            migrate_only,
            storage_backend,
            database_url,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
            default_roles,
            refine_options,
            bootstrap_admin,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|value| !value.trim().is_empty())
}

fn role_name(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: &str,
) -> Result<String, AppError> {
    match lookup(name) {
        None => Ok(default.to_owned()),
        Some(value) if value.trim().is_empty() => {
            Err(AppError::Validation(format!("{name} must not be empty")))
        }
        Some(value) => Ok(value.trim().to_owned()),
    }
}

fn parse_optional<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, AppError>
where
    T: FromStr<Err = AppError>,
{
    non_empty(lookup, name)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use congress_core::AppError;
    use congress_domain::{LogicalMode, TextMatchMode};

    use super::{ApiConfig, StorageBackend};

    fn load(command: Option<&str>, vars: &[(&str, &str)]) -> Result<ApiConfig, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        ApiConfig::from_lookup(command, |name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = load(None, &[("DATABASE_URL", "postgres://localhost/congress")])
            .unwrap_or_else(|_| unreachable!());

        assert_eq!(config.storage_backend, StorageBackend::Postgres);
        assert_eq!(config.api_port, 3001);
        assert_eq!(config.frontend_url, "http://localhost:3000");
        assert_eq!(config.default_roles.guest, "guest");
        assert_eq!(config.default_roles.admin, "admin");
        assert_eq!(
            config.refine_options.text_match,
            TextMatchMode::CaseInsensitive
        );
        assert_eq!(config.refine_options.same_operator_mode, LogicalMode::And);
        assert!(config.bootstrap_admin.is_none());
        assert!(!config.migrate_only);
    }

    #[test]
    fn postgres_backend_requires_database_url() {
        assert!(matches!(load(None, &[]), Err(AppError::Validation(_))));
    }

    #[test]
    fn memory_backend_needs_no_database_and_cannot_migrate() {
        let config = load(None, &[("STORAGE_BACKEND", "memory")]);
        let migrate = load(Some("migrate"), &[("STORAGE_BACKEND", "memory")]);

        assert!(matches!(config, Ok(config) if config.database_url.is_none()));
        assert!(matches!(migrate, Err(AppError::Validation(_))));
    }

    #[test]
    fn refine_policies_are_parsed_strictly() {
        let config = load(
            None,
            &[
                ("STORAGE_BACKEND", "memory"),
                ("REFINE_TEXT_MATCH", "case_sensitive"),
                ("REFINE_SAME_OPERATOR_MODE", "or"),
            ],
        )
        .unwrap_or_else(|_| unreachable!());
        let invalid = load(
            None,
            &[
                ("STORAGE_BACKEND", "memory"),
                ("REFINE_SAME_OPERATOR_MODE", "xor"),
            ],
        );

        assert_eq!(config.refine_options.text_match, TextMatchMode::CaseSensitive);
        assert_eq!(config.refine_options.same_operator_mode, LogicalMode::Or);
        assert!(matches!(invalid, Err(AppError::Validation(_))));
    }

    #[test]
    fn bootstrap_admin_needs_both_variables() {
        let partial = load(
            None,
            &[
                ("STORAGE_BACKEND", "memory"),
                ("BOOTSTRAP_ADMIN_EMAIL", "admin@example.org"),
            ],
        );
        let complete = load(
            None,
            &[
                ("STORAGE_BACKEND", "memory"),
                ("BOOTSTRAP_ADMIN_EMAIL", "admin@example.org"),
                ("BOOTSTRAP_ADMIN_PASSWORD", "correct horse battery"),
            ],
        );

        assert!(matches!(partial, Err(AppError::Validation(_))));
        assert!(matches!(
            complete,
            Ok(config) if config.bootstrap_admin.as_ref().is_some_and(|admin| admin.email == "admin@example.org")
        ));
    }

    #[test]
    fn socket_address_rejects_hostnames() {
        let config = load(
            None,
            &[("STORAGE_BACKEND", "memory"), ("API_HOST", "localhost")],
        )
        .unwrap_or_else(|_| unreachable!());

        assert!(matches!(
            config.socket_address(),
            Err(AppError::Internal(_))
        ));
    }
}
