//! Congress domain: permission grammar, entity schemas and typed values.

#![forbid(unsafe_code)]

mod account;
mod catalog;
mod decision;
mod entity;
mod permission;
mod query;
mod record;
mod schema;
mod value;

pub use account::{
    EmailAddress, PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, validate_password,
};
pub use catalog::{ResourceCatalog, ResourceDefinition};
pub use decision::{Decision, DenyReason, ObjectAction, ObjectPermission};
pub use entity::EntityKind;
pub use permission::{Action, PermissionString, satisfies};
pub use query::{FilterOperator, LogicalMode, SortDirection, TextMatchMode};
pub use record::Record;
pub use schema::{EntitySchema, FieldDefinition, FieldType, IMPLICIT_FIELDS, PayloadMode};
pub use value::{RawValue, TypedValue, coerce_value, parse_date_only, parse_datetime};
