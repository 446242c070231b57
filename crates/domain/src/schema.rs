use std::str::FromStr;

use chrono::SecondsFormat;
use congress_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::value::{parse_date_only, parse_datetime};

/// Supported entity field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// UTF-8 string field.
    Text,
    /// Whole-number field.
    Integer,
    /// Floating point field.
    Float,
    /// Boolean field.
    Boolean,
    /// Date-only string field (`YYYY-MM-DD`).
    Date,
    /// Date-time string field, stored as RFC3339 UTC.
    DateTime,
    /// Identifier of another record.
    Reference,
}

impl FieldType {
    /// Returns a stable storage value for the field type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Reference => "reference",
        }
    }

    /// Returns whether values of this type compare numerically.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Float)
    }

    /// Returns whether values of this type compare chronologically.
    #[must_use]
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    fn validate_value(self, value: &Value) -> AppResult<()> {
        let is_valid = match self {
            Self::Text => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Date => value.as_str().and_then(parse_date_only).is_some(),
            Self::DateTime => value.as_str().and_then(parse_datetime).is_some(),
            Self::Reference => value
                .as_str()
                .map(|text| !text.trim().is_empty())
                .unwrap_or(false),
        };

        if !is_valid {
            return Err(AppError::Validation(format!(
                "value does not match field type '{}'",
                self.as_str()
            )));
        }

        Ok(())
    }

    fn normalize_value(self, value: Value) -> Value {
        match (self, value.as_str().and_then(parse_datetime)) {
            (Self::DateTime, Some(instant)) => {
                Value::String(instant.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            _ => value,
        }
    }
}

impl FromStr for FieldType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "datetime" => Ok(Self::DateTime),
            "reference" => Ok(Self::Reference),
            _ => Err(AppError::Validation(format!(
                "unknown field type '{value}'"
            ))),
        }
    }
}

/// A declared field of an entity schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    name: &'static str,
    field_type: FieldType,
    is_required: bool,
}

impl FieldDefinition {
    /// Declares a field that must be present on create.
    #[must_use]
    pub const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            is_required: true,
        }
    }

    /// Declares a nullable field.
    #[must_use]
    pub const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            is_required: false,
        }
    }

    /// Returns the field name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the field type.
    #[must_use]
    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    /// Returns whether the field is required.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.is_required
    }
}

/// System-managed fields present on every entity.
pub const IMPLICIT_FIELDS: &[FieldDefinition] = &[
    FieldDefinition::optional("id", FieldType::Text),
    FieldDefinition::optional("created_at", FieldType::DateTime),
    FieldDefinition::optional("updated_at", FieldType::DateTime),
];

/// How a payload is checked against a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadMode {
    /// Full document; required fields must be present.
    Create,
    /// Partial patch; only supplied fields are checked.
    Update,
}

/// Field registry of one entity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitySchema {
    fields: &'static [FieldDefinition],
}

impl EntitySchema {
    /// Creates a schema from its declared fields.
    #[must_use]
    pub const fn new(fields: &'static [FieldDefinition]) -> Self {
        Self { fields }
    }

    /// Returns the declared (non-implicit) fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &'static [FieldDefinition] {
        self.fields
    }

    /// Returns the type of a declared or implicit field.
    #[must_use]
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        IMPLICIT_FIELDS
            .iter()
            .chain(self.fields.iter())
            .find(|field| field.name == name)
            .map(FieldDefinition::field_type)
    }

    /// Returns whether the field exists on the entity.
    #[must_use]
    pub fn has_field(&self, name: &str) -> bool {
        self.field_type(name).is_some()
    }

    /// Validates a write payload and returns its normalized object.
    pub fn validate_payload(&self, payload: &Value, mode: PayloadMode) -> AppResult<Map<String, Value>> {
        let object = payload.as_object().ok_or_else(|| {
            AppError::Validation("record payload must be a JSON object".to_owned())
        })?;

        let mut normalized = Map::with_capacity(object.len());
        for (key, value) in object {
            if IMPLICIT_FIELDS.iter().any(|field| field.name == key) {
                return Err(AppError::Validation(format!(
                    "field '{key}' is managed by the system"
                )));
            }

            let field = self
                .fields
                .iter()
                .find(|field| field.name == key)
                .ok_or_else(|| AppError::Validation(format!("unknown field '{key}'")))?;

            if value.is_null() {
                if field.is_required {
                    return Err(AppError::Validation(format!(
                        "field '{key}' must not be null"
                    )));
                }
                normalized.insert(key.clone(), Value::Null);
                continue;
            }

            field.field_type.validate_value(value).map_err(|error| match error {
                AppError::Validation(message) => {
                    AppError::Validation(format!("field '{key}': {message}"))
                }
                other => other,
            })?;
            normalized.insert(key.clone(), field.field_type.normalize_value(value.clone()));
        }

        if mode == PayloadMode::Create
            && let Some(missing) = self
                .fields
                .iter()
                .find(|field| field.is_required && !normalized.contains_key(field.name))
        {
            return Err(AppError::Validation(format!(
                "field '{}' is required",
                missing.name
            )));
        }

        Ok(normalized)
    }
}
