//! Query refinement for list endpoints.
//!
//! Raw query parameters become a predicate tree, sort keys and a pagination
//! window. The tree is storage-neutral: the in-memory adapter evaluates it
//! with [`Predicate::matches`], the PostgreSQL adapter translates it to SQL.

mod explicit;
mod filters;
mod pagination;
mod predicate;
mod sort;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use congress_core::AppResult;
use congress_domain::{EntityKind, EntitySchema, LogicalMode, RawValue, Record, TextMatchMode};
use tracing::debug;

use crate::RecordRepository;

pub use explicit::{ExplicitCondition, ExplicitQuery};
pub use filters::{FilterClause, RESERVED_PARAMS, parse_filters, split_parameter_name};
pub use pagination::{PaginationWindow, apply_pagination};
pub use predicate::{Predicate, build_predicate, compose_filters};
pub use sort::{ResolvedSortKey, SortKey, apply_sort, parse_sort, resolve_sort};

/// Flat query parameters; repeated names collapse into [`RawValue::Many`].
pub type QueryParams = BTreeMap<String, RawValue>;

/// Deployment-level refinement policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RefineOptions {
    /// Case handling for `contains` and `like`.
    pub text_match: TextMatchMode,
    /// How clauses sharing one operator combine.
    pub same_operator_mode: LogicalMode,
}

/// A fully parsed list request.
#[derive(Debug, Clone, PartialEq)]
pub struct RefineQuery {
    /// Filter tree.
    pub predicate: Predicate,
    /// Requested sort keys, unresolved.
    pub sort: Vec<SortKey>,
    /// Requested page.
    pub window: PaginationWindow,
}

impl RefineQuery {
    /// Parses filters, sort and pagination from list parameters.
    #[must_use]
    pub fn from_params(params: &QueryParams, schema: &EntitySchema, options: &RefineOptions) -> Self {
        let clauses = parse_filters(params, schema);

        Self {
            predicate: compose_filters(&clauses, options),
            sort: parse_sort(single_param(params, "_sort"), single_param(params, "_order")),
            window: PaginationWindow::from_params(
                integer_param(params, "_start"),
                integer_param(params, "_end"),
                integer_param(params, "currentPage"),
                integer_param(params, "pageSize"),
            ),
        }
    }

    /// Narrows the query with a mandatory scope.
    #[must_use]
    pub fn and_scope(mut self, scope: Predicate) -> Self {
        self.predicate = scope.and(self.predicate);
        self
    }
}

/// One page of refined items with the total number of matches.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinedPage<T> {
    /// Items of the requested window.
    pub items: Vec<T>,
    /// Matches before pagination.
    pub total: u64,
}

/// Runs a refine query against a record collection.
pub async fn refine(
    collection: &dyn RecordRepository,
    kind: EntityKind,
    query: RefineQuery,
) -> AppResult<RefinedPage<Record>> {
    let sort = resolve_sort(&query.sort, kind.schema());
    let total = collection.count_records(kind, &query.predicate).await?;
    let items = collection
        .fetch_records(kind, &query.predicate, &sort, query.window)
        .await?;

    debug!(
        resource = %kind,
        total,
        offset = query.window.offset(),
        limit = query.window.limit(),
        "refined record query"
    );

    Ok(RefinedPage { items, total })
}

fn single_param<'a>(params: &'a QueryParams, name: &str) -> Option<&'a str> {
    match params.get(name)? {
        RawValue::Single(value) => Some(value.as_str()),
        RawValue::Many(values) => values.last().map(String::as_str),
    }
}

fn integer_param(params: &QueryParams, name: &str) -> Option<i64> {
    single_param(params, name).and_then(|value| value.trim().parse().ok())
}
