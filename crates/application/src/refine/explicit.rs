use congress_core::AppResult;
use congress_domain::{EntitySchema, FilterOperator, RawValue};

use super::{FilterClause, PaginationWindow, RefineOptions, RefineQuery, SortKey, compose_filters};

/// One condition of an explicit query body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitCondition {
    /// Field name.
    pub field: String,
    /// Operator name, parsed strictly.
    pub operator: String,
    /// Raw value.
    pub value: RawValue,
}

/// A query whose operators are named explicitly rather than by suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitQuery {
    /// Conditions, combined like suffix filters.
    pub conditions: Vec<ExplicitCondition>,
    /// Sort keys.
    pub sort: Vec<SortKey>,
    /// Requested page.
    pub window: PaginationWindow,
}

impl ExplicitQuery {
    /// Converts the query; unknown operators fail, unknown fields are dropped.
    pub fn into_refine_query(
        self,
        schema: &EntitySchema,
        options: &RefineOptions,
    ) -> AppResult<RefineQuery> {
        let mut clauses = Vec::with_capacity(self.conditions.len());
        for condition in &self.conditions {
            let operator = FilterOperator::parse_transport(condition.operator.trim())?;
            if let Some(clause) =
                FilterClause::resolve(&condition.field, operator, &condition.value, schema)
            {
                clauses.push(clause);
            }
        }

        Ok(RefineQuery {
            predicate: compose_filters(&clauses, options),
            sort: self.sort,
            window: self.window,
        })
    }
}
