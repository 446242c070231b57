//! Application services and ports.

#![forbid(unsafe_code)]

mod authorization_service;
mod record_ports;
mod record_service;
pub mod refine;
mod security_admin_ports;
mod security_admin_service;
mod user_service;

pub use authorization_service::{AuthorizationRepository, AuthorizationService};
pub use record_ports::RecordRepository;
pub use record_service::RecordService;
pub use refine::{
    ExplicitCondition, ExplicitQuery, PaginationWindow, Predicate, QueryParams, RefineOptions,
    RefineQuery, RefinedPage, ResolvedSortKey, SortKey, refine,
};
pub use security_admin_ports::{CreateRoleInput, RoleDefinition, SecurityAdminRepository};
pub use security_admin_service::{DefaultRoles, SecurityAdminService};
pub use user_service::{PasswordHasher, UserRecord, UserRepository, UserService};
