use congress_domain::{EntitySchema, FieldType, FilterOperator, RawValue, TypedValue, coerce_value};

use super::QueryParams;

/// Parameters that drive sorting and pagination, never filtering.
pub const RESERVED_PARAMS: &[&str] = &["_start", "_end", "_sort", "_order", "currentPage", "pageSize"];

/// One parsed filter with its value already coerced.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    /// Field name on the target entity.
    pub field: String,
    /// Declared type of the field.
    pub field_type: FieldType,
    /// Resolved operator.
    pub operator: FilterOperator,
    /// Coerced value.
    pub value: TypedValue,
}

impl FilterClause {
    /// Builds a clause when the field exists on the schema.
    ///
    /// A list under `eq` becomes a membership test.
    #[must_use]
    pub fn resolve(
        field: &str,
        operator: FilterOperator,
        raw: &RawValue,
        schema: &EntitySchema,
    ) -> Option<Self> {
        let field_type = schema.field_type(field)?;
        let operator = if operator == FilterOperator::Eq && raw.is_list() {
            FilterOperator::In
        } else {
            operator
        };

        Some(Self {
            field: field.to_owned(),
            field_type,
            operator,
            value: coerce_value(raw, field_type),
        })
    }
}

/// Splits `field_op` on the last underscore when the suffix is an operator.
#[must_use]
pub fn split_parameter_name(name: &str) -> (&str, FilterOperator) {
    name.rsplit_once('_')
        .and_then(|(field, suffix)| {
            FilterOperator::from_suffix(suffix)
                .filter(|_| !field.is_empty())
                .map(|operator| (field, operator))
        })
        .unwrap_or((name, FilterOperator::Eq))
}

/// Parses filter clauses from list parameters.
///
/// Fields missing from the schema are dropped silently.
#[must_use]
pub fn parse_filters(params: &QueryParams, schema: &EntitySchema) -> Vec<FilterClause> {
    params
        .iter()
        .filter(|(name, _)| !RESERVED_PARAMS.contains(&name.as_str()))
        .filter_map(|(name, raw)| {
            let (field, operator) = split_parameter_name(name);
            FilterClause::resolve(field, operator, raw, schema)
        })
        .collect()
}
