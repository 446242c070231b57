use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::schema::FieldType;

/// An untyped query parameter value as received from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawValue {
    /// A single textual value.
    Single(String),
    /// A repeated parameter or explicit list.
    Many(Vec<String>),
}

impl RawValue {
    /// Converts a JSON condition value into a raw value.
    ///
    /// Objects and nested arrays are not representable and yield `None`.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(scalar_text)
                .collect::<Option<Vec<_>>>()
                .map(Self::Many),
            other => scalar_text(other).map(Self::Single),
        }
    }

    /// Splits a single comma-separated value into a list.
    #[must_use]
    pub fn into_list(self) -> Self {
        match self {
            Self::Single(value) => Self::Many(
                value
                    .split(',')
                    .map(|item| item.trim().to_owned())
                    .filter(|item| !item.is_empty())
                    .collect(),
            ),
            many => many,
        }
    }

    /// Returns whether the value carries several items.
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::Many(_))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// A filter value coerced towards the type of the field it targets.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValue {
    /// Plain text.
    Text(String),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Boolean(bool),
    /// Calendar date without time; compares against date-truncated columns.
    Date(NaiveDate),
    /// Instant in UTC.
    DateTime(DateTime<Utc>),
    /// Membership list.
    List(Vec<TypedValue>),
}

impl TypedValue {
    /// Renders the value in its canonical textual form.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
            Self::Boolean(value) => value.to_string(),
            Self::Date(value) => value.format("%Y-%m-%d").to_string(),
            Self::DateTime(value) => value.to_rfc3339_opts(SecondsFormat::Secs, true),
            Self::List(values) => values
                .iter()
                .map(Self::render)
                .collect::<Vec<_>>()
                .join(","),
        }
    }

    /// Returns whether the value is a date without time.
    #[must_use]
    pub fn is_date_only(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

/// Coerces a raw parameter value for a field of the given type.
///
/// Never fails: anything that does not parse stays text. Order of attempts
/// is list expansion, date-only, date-time, then numbers and booleans for
/// fields of those types.
#[must_use]
pub fn coerce_value(raw: &RawValue, field_type: FieldType) -> TypedValue {
    match raw {
        RawValue::Many(items) => TypedValue::List(
            items
                .iter()
                .map(|item| coerce_scalar(item, field_type))
                .collect(),
        ),
        RawValue::Single(value) => coerce_scalar(value, field_type),
    }
}

fn coerce_scalar(raw: &str, field_type: FieldType) -> TypedValue {
    if let Some(date) = parse_date_only(raw) {
        return TypedValue::Date(date);
    }

    if let Some(instant) = parse_datetime(raw) {
        return TypedValue::DateTime(instant);
    }

    let trimmed = raw.trim();
    match field_type {
        FieldType::Integer => {
            if let Ok(value) = trimmed.parse::<i64>() {
                return TypedValue::Integer(value);
            }
            if let Some(value) = parse_finite_float(trimmed) {
                return TypedValue::Float(value);
            }
        }
        FieldType::Float => {
            if let Some(value) = parse_finite_float(trimmed) {
                return TypedValue::Float(value);
            }
        }
        FieldType::Boolean => {
            if let Some(value) = parse_boolean(trimmed) {
                return TypedValue::Boolean(value);
            }
        }
        FieldType::Text | FieldType::Date | FieldType::DateTime | FieldType::Reference => {}
    }

    TypedValue::Text(raw.to_owned())
}

fn parse_finite_float(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|number| number.is_finite())
}

fn parse_boolean(value: &str) -> Option<bool> {
    if value.eq_ignore_ascii_case("true") || value == "1" {
        Some(true)
    } else if value.eq_ignore_ascii_case("false") || value == "0" {
        Some(false)
    } else {
        None
    }
}

/// Parses `YYYY-MM-DD`, rejecting anything longer or shaped differently.
#[must_use]
pub fn parse_date_only(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 || value.matches('-').count() != 2 {
        return None;
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Parses an ISO-8601 date-time; offset-less values are taken as UTC.
#[must_use]
pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Some(instant.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}
