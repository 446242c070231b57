//! Translation of refinement predicates into SQL.
//!
//! Every typed read of a JSONB field goes through a `CASE` guard on
//! `jsonb_typeof`, so values of the wrong JSON type read as `NULL` and never
//! match. That keeps the SQL path aligned with `Predicate::matches`.

use sqlx::{Postgres, QueryBuilder};

use congress_application::{Predicate, ResolvedSortKey};
use congress_domain::{FieldType, FilterOperator, SortDirection, TypedValue};

const DATE_PREFIX: &str = r"'^\d{4}-\d{2}-\d{2}'";
const DATE_ONLY: &str = r"'^\d{4}-\d{2}-\d{2}$'";
const RFC3339_SECONDS: &str = r#"'YYYY-MM-DD"T"HH24:MI:SS"Z"'"#;

#[derive(Debug, Clone, Copy)]
enum Column<'a> {
    Id,
    Timestamp(&'static str),
    Data(&'a str),
}

impl<'a> Column<'a> {
    fn of(field: &'a str) -> Self {
        match field {
            "id" => Self::Id,
            "created_at" => Self::Timestamp("records.created_at"),
            "updated_at" => Self::Timestamp("records.updated_at"),
            other => Self::Data(other),
        }
    }
}

/// How a stored value is read for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reading {
    /// JSON strings only.
    Text,
    /// Strings, numbers and booleans rendered as text.
    Scalar,
    Number,
    Boolean,
    /// Calendar date; date-times are truncated in UTC.
    Date,
    /// Instant; date-only strings are midnight UTC.
    Instant,
}

impl Reading {
    fn for_sort(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Integer | FieldType::Float => Self::Number,
            FieldType::Boolean => Self::Boolean,
            FieldType::Date | FieldType::DateTime => Self::Instant,
            FieldType::Text | FieldType::Reference => Self::Text,
        }
    }

    fn sql_type(self) -> &'static str {
        match self {
            Self::Text | Self::Scalar => "text",
            Self::Number => "double precision",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Instant => "timestamptz",
        }
    }
}

/// Appends the boolean SQL expression of a predicate.
pub(super) fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Always => {
            builder.push("TRUE");
        }
        Predicate::All(predicates) => push_junction(builder, predicates, " AND ", "TRUE"),
        Predicate::Any(predicates) => push_junction(builder, predicates, " OR ", "FALSE"),
        Predicate::Compare {
            field,
            operator,
            value,
            truncate_to_date,
            ..
        } => push_compare(builder, field, *operator, value, *truncate_to_date),
        Predicate::Contains {
            field,
            needle,
            case_sensitive,
        } => {
            builder.push('(');
            push_reading(builder, Column::of(field), Reading::Scalar);
            builder.push(if *case_sensitive { " LIKE " } else { " ILIKE " });
            builder.push_bind(format!("%{}%", escape_like(needle)));
            builder.push(')');
        }
        Predicate::In { field, values, .. } => {
            if values.is_empty() {
                builder.push("FALSE");
                return;
            }

            builder.push('(');
            for (index, value) in values.iter().enumerate() {
                if index > 0 {
                    builder.push(" OR ");
                }
                push_compare(builder, field, FilterOperator::Eq, value, value.is_date_only());
            }
            builder.push(')');
        }
    }
}

/// Appends `ORDER BY` for the sort keys with the record id as final key.
///
/// `NULLS LAST` ascending and `NULLS FIRST` descending match the in-memory
/// rule that present values sort before missing ones and `desc` reverses it.
pub(super) fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, sort: &[ResolvedSortKey]) {
    builder.push(" ORDER BY ");
    for key in sort {
        let reading = Reading::for_sort(key.field_type);
        builder.push('(');
        push_reading(builder, Column::of(&key.field), reading);
        builder.push(')');
        if reading == Reading::Text {
            builder.push(r#" COLLATE "C""#);
        }
        builder.push(match key.direction {
            SortDirection::Asc => " ASC NULLS LAST, ",
            SortDirection::Desc => " DESC NULLS FIRST, ",
        });
    }
    builder.push(r#"records.id COLLATE "C" ASC"#);
}

fn push_junction(
    builder: &mut QueryBuilder<'_, Postgres>,
    predicates: &[Predicate],
    separator: &str,
    empty: &str,
) {
    if predicates.is_empty() {
        builder.push(empty);
        return;
    }

    builder.push('(');
    for (index, predicate) in predicates.iter().enumerate() {
        if index > 0 {
            builder.push(separator);
        }
        push_predicate(builder, predicate);
    }
    builder.push(')');
}

fn push_compare(
    builder: &mut QueryBuilder<'_, Postgres>,
    field: &str,
    operator: FilterOperator,
    value: &TypedValue,
    truncate_to_date: bool,
) {
    let Some(symbol) = comparison_symbol(operator) else {
        builder.push("FALSE");
        return;
    };
    let column = Column::of(field);

    builder.push("((");
    match value {
        TypedValue::Text(text) => {
            push_reading(builder, column, Reading::Text);
            builder.push(r#") COLLATE "C" "#);
            builder.push(symbol);
            builder.push(' ');
            builder.push_bind(text.clone());
        }
        TypedValue::Integer(number) => {
            push_reading(builder, column, Reading::Number);
            push_operator(builder, symbol);
            builder.push_bind(*number as f64);
        }
        TypedValue::Float(number) => {
            push_reading(builder, column, Reading::Number);
            push_operator(builder, symbol);
            builder.push_bind(*number);
        }
        TypedValue::Boolean(flag) => {
            push_reading(builder, column, Reading::Boolean);
            push_operator(builder, symbol);
            builder.push_bind(*flag);
        }
        TypedValue::Date(date) if truncate_to_date => {
            push_reading(builder, column, Reading::Date);
            push_operator(builder, symbol);
            builder.push_bind(*date);
        }
        TypedValue::Date(date) => {
            push_reading(builder, column, Reading::Instant);
            push_operator(builder, symbol);
            builder.push_bind(date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc()));
        }
        TypedValue::DateTime(instant) => {
            push_reading(builder, column, Reading::Instant);
            push_operator(builder, symbol);
            builder.push_bind(*instant);
        }
        TypedValue::List(_) => {
            builder.push("FALSE)");
        }
    }
    builder.push(')');
}

fn push_operator(builder: &mut QueryBuilder<'_, Postgres>, symbol: &str) {
    builder.push(") ");
    builder.push(symbol);
    builder.push(' ');
}

fn push_reading(builder: &mut QueryBuilder<'_, Postgres>, column: Column<'_>, reading: Reading) {
    match column {
        Column::Id => match reading {
            Reading::Text | Reading::Scalar => {
                builder.push("records.id");
            }
            other => push_null(builder, other),
        },
        Column::Timestamp(name) => match reading {
            Reading::Text | Reading::Scalar => {
                builder.push("to_char(");
                builder.push(name);
                builder.push(" AT TIME ZONE 'UTC', ");
                builder.push(RFC3339_SECONDS);
                builder.push(')');
            }
            Reading::Date => {
                builder.push("(");
                builder.push(name);
                builder.push(" AT TIME ZONE 'UTC')::date");
            }
            Reading::Instant => {
                builder.push("date_trunc('second', ");
                builder.push(name);
                builder.push(')');
            }
            other => push_null(builder, other),
        },
        Column::Data(field) => push_data_reading(builder, field, reading),
    }
}

fn push_data_reading(builder: &mut QueryBuilder<'_, Postgres>, field: &str, reading: Reading) {
    builder.push("CASE WHEN ");
    push_json_type(builder, field);
    match reading {
        Reading::Text => {
            builder.push(" = 'string' THEN ");
            push_text(builder, field);
        }
        Reading::Scalar => {
            builder.push(" IN ('string', 'number', 'boolean') THEN ");
            push_text(builder, field);
        }
        Reading::Number => {
            builder.push(" = 'number' THEN (");
            push_text(builder, field);
            builder.push(")::double precision");
        }
        Reading::Boolean => {
            builder.push(" = 'boolean' THEN (");
            push_text(builder, field);
            builder.push(")::boolean");
        }
        Reading::Date | Reading::Instant => {
            builder.push(" = 'string' AND ");
            push_text(builder, field);
            builder.push(" ~ ");
            builder.push(DATE_ONLY);
            builder.push(" THEN ");
            if reading == Reading::Date {
                builder.push('(');
                push_text(builder, field);
                builder.push(")::date");
            } else {
                builder.push("((");
                push_text(builder, field);
                builder.push(")::date)::timestamp AT TIME ZONE 'UTC'");
            }

            builder.push(" WHEN ");
            push_json_type(builder, field);
            builder.push(" = 'string' AND ");
            push_text(builder, field);
            builder.push(" ~ ");
            builder.push(DATE_PREFIX);
            builder.push(" THEN ");
            if reading == Reading::Date {
                builder.push("((");
                push_text(builder, field);
                builder.push(")::timestamptz AT TIME ZONE 'UTC')::date");
            } else {
                builder.push('(');
                push_text(builder, field);
                builder.push(")::timestamptz");
            }
        }
    }
    builder.push(" END");
}

fn push_json_type(builder: &mut QueryBuilder<'_, Postgres>, field: &str) {
    builder.push("jsonb_typeof(records.data -> ");
    builder.push_bind(field.to_owned());
    builder.push(')');
}

fn push_text(builder: &mut QueryBuilder<'_, Postgres>, field: &str) {
    builder.push("(records.data ->> ");
    builder.push_bind(field.to_owned());
    builder.push(')');
}

fn push_null(builder: &mut QueryBuilder<'_, Postgres>, reading: Reading) {
    builder.push("CAST(NULL AS ");
    builder.push(reading.sql_type());
    builder.push(')');
}

fn comparison_symbol(operator: FilterOperator) -> Option<&'static str> {
    match operator {
        FilterOperator::Eq => Some("="),
        FilterOperator::Ne => Some("<>"),
        FilterOperator::Gt => Some(">"),
        FilterOperator::Gte => Some(">="),
        FilterOperator::Lt => Some("<"),
        FilterOperator::Lte => Some("<="),
        FilterOperator::Contains | FilterOperator::Like | FilterOperator::In => None,
    }
}

/// Escapes `LIKE` wildcards so the needle matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for character in value.chars() {
        if matches!(character, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}
