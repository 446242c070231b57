use std::cmp::Ordering;

use congress_domain::{EntitySchema, FieldType, Record, SortDirection, parse_date_only, parse_datetime};
use serde_json::Value;

/// A requested sort key; the field may not exist on the entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    /// Field name.
    pub field: String,
    /// Direction.
    pub direction: SortDirection,
}

/// A sort key checked against the entity schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSortKey {
    /// Field name.
    pub field: String,
    /// Declared field type, used for typed ordering.
    pub field_type: FieldType,
    /// Direction.
    pub direction: SortDirection,
}

/// Zips comma-separated fields with comma-separated directions.
///
/// Missing or unknown directions sort ascending.
#[must_use]
pub fn parse_sort(fields: Option<&str>, directions: Option<&str>) -> Vec<SortKey> {
    let Some(fields) = fields else {
        return Vec::new();
    };

    let directions: Vec<SortDirection> = directions
        .map(|value| value.split(',').map(SortDirection::parse_lenient).collect())
        .unwrap_or_default();
    let mut directions = directions.into_iter();

    fields
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| SortKey {
            field: field.to_owned(),
            direction: directions.next().unwrap_or_default(),
        })
        .collect()
}

/// Drops sort keys naming fields the schema does not declare.
#[must_use]
pub fn resolve_sort(keys: &[SortKey], schema: &EntitySchema) -> Vec<ResolvedSortKey> {
    keys.iter()
        .filter_map(|key| {
            schema.field_type(&key.field).map(|field_type| ResolvedSortKey {
                field: key.field.clone(),
                field_type,
                direction: key.direction,
            })
        })
        .collect()
}

/// Sorts records by the keys in order, then by record id.
///
/// Present values order before missing ones; descending keys reverse both.
pub fn apply_sort(records: &mut [Record], keys: &[ResolvedSortKey]) {
    records.sort_by(|left, right| {
        for key in keys {
            let ordering = compare_field(left, right, key);
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        left.record_id().as_str().cmp(right.record_id().as_str())
    });
}

fn compare_field(left: &Record, right: &Record, key: &ResolvedSortKey) -> Ordering {
    let left_value = left.field_value(&key.field).filter(|value| !value.is_null());
    let right_value = right.field_value(&key.field).filter(|value| !value.is_null());

    match (left_value, right_value) {
        (Some(left_value), Some(right_value)) => {
            compare_sort_values(&left_value, &right_value, key.field_type)
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_sort_values(left: &Value, right: &Value, field_type: FieldType) -> Ordering {
    match field_type {
        FieldType::Integer | FieldType::Float => left
            .as_f64()
            .zip(right.as_f64())
            .and_then(|(left, right)| left.partial_cmp(&right))
            .unwrap_or(Ordering::Equal),
        FieldType::Boolean => left
            .as_bool()
            .zip(right.as_bool())
            .map(|(left, right)| left.cmp(&right))
            .unwrap_or(Ordering::Equal),
        FieldType::Date | FieldType::DateTime => {
            let instant = |value: &Value| {
                value.as_str().and_then(|text| {
                    parse_datetime(text).or_else(|| {
                        parse_date_only(text)
                            .and_then(|date| date.and_hms_opt(0, 0, 0))
                            .map(|naive| naive.and_utc())
                    })
                })
            };
            instant(left).cmp(&instant(right))
        }
        FieldType::Text | FieldType::Reference => match (left.as_str(), right.as_str()) {
            (Some(left), Some(right)) => left.cmp(right),
            _ => left.to_string().cmp(&right.to_string()),
        },
    }
}
