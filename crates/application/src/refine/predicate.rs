use std::cmp::Ordering;
use std::collections::BTreeMap;

use congress_domain::{
    FieldType, FilterOperator, LogicalMode, RawValue, Record, TextMatchMode, TypedValue,
    coerce_value, parse_date_only, parse_datetime,
};
use serde_json::Value;

use super::{FilterClause, RefineOptions};

/// Storage-neutral boolean filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record.
    Always,
    /// Ordered comparison of a field against a value.
    Compare {
        /// Field name.
        field: String,
        /// Declared field type.
        field_type: FieldType,
        /// One of `eq`, `ne`, `gt`, `gte`, `lt`, `lte`.
        operator: FilterOperator,
        /// Right-hand side.
        value: TypedValue,
        /// Compare the date part of the stored value only.
        truncate_to_date: bool,
    },
    /// Substring match.
    Contains {
        /// Field name.
        field: String,
        /// Substring to look for.
        needle: String,
        /// Whether letter case must match.
        case_sensitive: bool,
    },
    /// Membership test.
    In {
        /// Field name.
        field: String,
        /// Declared field type.
        field_type: FieldType,
        /// Accepted values.
        values: Vec<TypedValue>,
    },
    /// Conjunction; empty matches everything.
    All(Vec<Predicate>),
    /// Disjunction; empty matches nothing.
    Any(Vec<Predicate>),
}

impl Predicate {
    /// Combines two predicates with AND, flattening trivial sides.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::Always, other) | (other, Self::Always) => other,
            (Self::All(mut left), Self::All(right)) => {
                left.extend(right);
                Self::All(left)
            }
            (Self::All(mut left), other) => {
                left.push(other);
                Self::All(left)
            }
            (left, right) => Self::All(vec![left, right]),
        }
    }

    /// Evaluates the predicate against a record.
    ///
    /// Missing and null fields never match, mirroring SQL `NULL` semantics.
    #[must_use]
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Self::Always => true,
            Self::Compare {
                field,
                operator,
                value,
                truncate_to_date,
                ..
            } => stored_value(record, field)
                .and_then(|stored| compare_stored(&stored, value, *truncate_to_date))
                .is_some_and(|ordering| ordering_satisfies(*operator, ordering)),
            Self::Contains {
                field,
                needle,
                case_sensitive,
            } => stored_value(record, field)
                .and_then(|stored| stored_text(&stored))
                .is_some_and(|text| {
                    if *case_sensitive {
                        text.contains(needle.as_str())
                    } else {
                        text.to_lowercase().contains(&needle.to_lowercase())
                    }
                }),
            Self::In { field, values, .. } => stored_value(record, field).is_some_and(|stored| {
                values.iter().any(|value| {
                    compare_stored(&stored, value, value.is_date_only())
                        == Some(Ordering::Equal)
                })
            }),
            Self::All(predicates) => predicates.iter().all(|predicate| predicate.matches(record)),
            Self::Any(predicates) => predicates.iter().any(|predicate| predicate.matches(record)),
        }
    }
}

/// Builds the predicate for one clause.
#[must_use]
pub fn build_predicate(clause: &FilterClause, options: &RefineOptions) -> Predicate {
    match clause.operator {
        FilterOperator::Contains | FilterOperator::Like => {
            let case_sensitive = options.text_match == TextMatchMode::CaseSensitive;
            match &clause.value {
                TypedValue::List(values) => Predicate::Any(
                    values
                        .iter()
                        .map(|value| contains(&clause.field, value, case_sensitive))
                        .collect(),
                ),
                value => contains(&clause.field, value, case_sensitive),
            }
        }
        FilterOperator::In => Predicate::In {
            field: clause.field.clone(),
            field_type: clause.field_type,
            values: membership_values(&clause.value, clause.field_type)
                .into_iter()
                .map(|value| lower_for_field(value, clause.field_type))
                .collect(),
        },
        operator => match &clause.value {
            TypedValue::List(values) => {
                let compares = values
                    .iter()
                    .map(|value| compare(clause, operator, value.clone()))
                    .collect();
                if operator == FilterOperator::Ne {
                    Predicate::All(compares)
                } else {
                    Predicate::Any(compares)
                }
            }
            value => compare(clause, operator, value.clone()),
        },
    }
}

/// Groups clauses by operator and combines them into one predicate.
///
/// Groups are always joined with AND; clauses inside one group follow
/// `options.same_operator_mode`.
#[must_use]
pub fn compose_filters(clauses: &[FilterClause], options: &RefineOptions) -> Predicate {
    let mut groups: BTreeMap<FilterOperator, Vec<Predicate>> = BTreeMap::new();
    for clause in clauses {
        groups
            .entry(clause.operator)
            .or_default()
            .push(build_predicate(clause, options));
    }

    let mut combined: Vec<Predicate> = groups
        .into_values()
        .map(|mut group| {
            if group.len() == 1 {
                return group.remove(0);
            }
            match options.same_operator_mode {
                LogicalMode::And => Predicate::All(group),
                LogicalMode::Or => Predicate::Any(group),
            }
        })
        .collect();

    match combined.len() {
        0 => Predicate::Always,
        1 => combined.remove(0),
        _ => Predicate::All(combined),
    }
}

fn compare(clause: &FilterClause, operator: FilterOperator, value: TypedValue) -> Predicate {
    let value = lower_for_field(value, clause.field_type);
    Predicate::Compare {
        field: clause.field.clone(),
        field_type: clause.field_type,
        operator,
        truncate_to_date: value.is_date_only(),
        value,
    }
}

fn contains(field: &str, value: &TypedValue, case_sensitive: bool) -> Predicate {
    Predicate::Contains {
        field: field.to_owned(),
        needle: value.render(),
        case_sensitive,
    }
}

fn membership_values(value: &TypedValue, field_type: FieldType) -> Vec<TypedValue> {
    match value {
        TypedValue::List(values) => values.clone(),
        TypedValue::Text(text) if text.contains(',') => {
            match coerce_value(&RawValue::Single(text.clone()).into_list(), field_type) {
                TypedValue::List(values) => values,
                single => vec![single],
            }
        }
        single => vec![single.clone()],
    }
}

/// Temporal values against non-temporal fields compare as their text form.
fn lower_for_field(value: TypedValue, field_type: FieldType) -> TypedValue {
    match value {
        TypedValue::Date(_) | TypedValue::DateTime(_) if !field_type.is_temporal() => {
            TypedValue::Text(value.render())
        }
        other => other,
    }
}

fn stored_value(record: &Record, field: &str) -> Option<Value> {
    record.field_value(field).filter(|value| !value.is_null())
}

fn stored_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn compare_stored(stored: &Value, value: &TypedValue, truncate_to_date: bool) -> Option<Ordering> {
    match value {
        TypedValue::Date(date) if truncate_to_date => {
            let text = stored.as_str()?;
            let stored_date = parse_date_only(text)
                .or_else(|| parse_datetime(text).map(|instant| instant.date_naive()))?;
            Some(stored_date.cmp(date))
        }
        TypedValue::Date(date) => {
            let instant = date.and_hms_opt(0, 0, 0)?.and_utc();
            compare_stored(stored, &TypedValue::DateTime(instant), false)
        }
        TypedValue::DateTime(instant) => {
            let text = stored.as_str()?;
            let stored_instant = parse_datetime(text).or_else(|| {
                parse_date_only(text)
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|naive| naive.and_utc())
            })?;
            Some(stored_instant.cmp(instant))
        }
        TypedValue::Integer(number) => stored.as_f64()?.partial_cmp(&(*number as f64)),
        TypedValue::Float(number) => stored.as_f64()?.partial_cmp(number),
        TypedValue::Boolean(flag) => Some(stored.as_bool()?.cmp(flag)),
        TypedValue::Text(text) => Some(stored.as_str()?.cmp(text.as_str())),
        TypedValue::List(_) => None,
    }
}

fn ordering_satisfies(operator: FilterOperator, ordering: Ordering) -> bool {
    match operator {
        FilterOperator::Eq => ordering == Ordering::Equal,
        FilterOperator::Ne => ordering != Ordering::Equal,
        FilterOperator::Gt => ordering == Ordering::Greater,
        FilterOperator::Gte => ordering != Ordering::Less,
        FilterOperator::Lt => ordering == Ordering::Less,
        FilterOperator::Lte => ordering != Ordering::Greater,
        FilterOperator::Contains | FilterOperator::Like | FilterOperator::In => false,
    }
}
