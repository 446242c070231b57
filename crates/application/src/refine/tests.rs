use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::{Value, json};
use tokio::sync::RwLock;

use congress_core::{AppError, AppResult};
use congress_domain::{
    EntityKind, FieldType, FilterOperator, LogicalMode, RawValue, Record, SortDirection,
    TextMatchMode, TypedValue,
};

use crate::RecordRepository;

use super::{
    ExplicitCondition, ExplicitQuery, PaginationWindow, Predicate, QueryParams, RefineOptions,
    RefineQuery, ResolvedSortKey, SortKey, apply_pagination, apply_sort, build_predicate,
    compose_filters, parse_filters, parse_sort, refine, resolve_sort, split_parameter_name,
};

fn params(entries: &[(&str, &str)]) -> QueryParams {
    entries
        .iter()
        .map(|(name, value)| ((*name).to_owned(), RawValue::Single((*value).to_owned())))
        .collect()
}

fn event(id: &str, data: Value) -> Record {
    let created = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    Record::new(id, EntityKind::Events, data, created, created).unwrap_or_else(|_| unreachable!())
}

fn sample_events() -> Vec<Record> {
    vec![
        event(
            "e-1",
            json!({"name": "Opening Gala", "start_date": "2024-03-01T15:00:00Z", "end_date": "2024-03-01T20:00:00Z", "is_public": true}),
        ),
        event(
            "e-2",
            json!({"name": "Closing Dinner", "start_date": "2024-03-03T18:00:00Z", "end_date": "2024-03-03T23:00:00Z", "is_public": false}),
        ),
        event(
            "e-3",
            json!({"name": "opening workshop", "start_date": "2024-03-02T09:00:00Z", "end_date": "2024-03-02T12:00:00Z", "is_public": true}),
        ),
    ]
}

fn matching_ids(predicate: &Predicate, records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter(|record| predicate.matches(record))
        .map(|record| record.record_id().as_str().to_owned())
        .collect()
}

fn predicate_for(entries: &[(&str, &str)], options: &RefineOptions) -> Predicate {
    let clauses = parse_filters(&params(entries), EntityKind::Events.schema());
    compose_filters(&clauses, options)
}

#[test]
fn parameter_names_split_on_last_underscore() {
    assert_eq!(split_parameter_name("start_date_gte"), ("start_date", FilterOperator::Gte));
    assert_eq!(split_parameter_name("start_date"), ("start_date", FilterOperator::Eq));
    assert_eq!(split_parameter_name("name"), ("name", FilterOperator::Eq));
    assert_eq!(split_parameter_name("_in"), ("_in", FilterOperator::Eq));
}

#[test]
fn parse_filters_drops_unknown_fields_and_reserved_params() {
    let clauses = parse_filters(
        &params(&[
            ("name_contains", "gala"),
            ("color", "red"),
            ("_start", "0"),
            ("_end", "10"),
            ("_sort", "name"),
        ]),
        EntityKind::Events.schema(),
    );

    assert_eq!(clauses.len(), 1);
    assert_eq!(clauses[0].field, "name");
    assert_eq!(clauses[0].operator, FilterOperator::Contains);
}

#[test]
fn list_under_eq_becomes_membership() {
    let mut raw = QueryParams::new();
    raw.insert(
        "name".to_owned(),
        RawValue::Many(vec!["Opening Gala".to_owned(), "Closing Dinner".to_owned()]),
    );

    let clauses = parse_filters(&raw, EntityKind::Events.schema());
    assert_eq!(clauses[0].operator, FilterOperator::In);

    let predicate = compose_filters(&clauses, &RefineOptions::default());
    assert_eq!(matching_ids(&predicate, &sample_events()), vec!["e-1", "e-2"]);
}

#[test]
fn date_only_filter_matches_same_day_datetime() {
    let predicate = predicate_for(&[("start_date", "2024-03-01")], &RefineOptions::default());
    assert_eq!(matching_ids(&predicate, &sample_events()), vec!["e-1"]);
}

#[test]
fn date_only_range_compares_truncated_dates() {
    let predicate = predicate_for(
        &[("start_date_gte", "2024-03-02"), ("end_date_lte", "2024-03-03")],
        &RefineOptions::default(),
    );
    assert_eq!(matching_ids(&predicate, &sample_events()), vec!["e-2", "e-3"]);
}

#[test]
fn datetime_filter_compares_without_truncation() {
    let predicate = predicate_for(
        &[("start_date_gt", "2024-03-01T15:00:00Z")],
        &RefineOptions::default(),
    );
    assert_eq!(matching_ids(&predicate, &sample_events()), vec!["e-2", "e-3"]);
}

#[test]
fn date_only_value_sets_truncation_flag() {
    let clauses = parse_filters(&params(&[("start_date", "2024-03-01")]), EntityKind::Events.schema());
    let predicate = build_predicate(&clauses[0], &RefineOptions::default());

    assert!(matches!(
        predicate,
        Predicate::Compare { truncate_to_date: true, value: TypedValue::Date(_), .. }
    ));
}

#[test]
fn contains_honors_configured_case_sensitivity() {
    let insensitive = predicate_for(&[("name_contains", "opening")], &RefineOptions::default());
    assert_eq!(matching_ids(&insensitive, &sample_events()), vec!["e-1", "e-3"]);

    let sensitive_options = RefineOptions {
        text_match: TextMatchMode::CaseSensitive,
        ..RefineOptions::default()
    };
    let sensitive = predicate_for(&[("name_like", "opening")], &sensitive_options);
    assert_eq!(matching_ids(&sensitive, &sample_events()), vec!["e-3"]);
}

#[test]
fn in_splits_comma_separated_values() {
    let predicate = predicate_for(&[("id_in", "e-1,e-3")], &RefineOptions::default());
    assert_eq!(matching_ids(&predicate, &sample_events()), vec!["e-1", "e-3"]);
}

#[test]
fn boolean_filter_is_typed() {
    let predicate = predicate_for(&[("is_public", "false")], &RefineOptions::default());
    assert_eq!(matching_ids(&predicate, &sample_events()), vec!["e-2"]);
}

#[test]
fn same_operator_clauses_combine_with_and_by_default() {
    let predicate = predicate_for(
        &[("name_contains", "opening"), ("start_date_contains", "03-02")],
        &RefineOptions::default(),
    );
    assert_eq!(matching_ids(&predicate, &sample_events()), vec!["e-3"]);
}

#[test]
fn same_operator_clauses_combine_with_or_when_configured() {
    let options = RefineOptions {
        same_operator_mode: LogicalMode::Or,
        ..RefineOptions::default()
    };
    let predicate = predicate_for(
        &[("name_contains", "gala"), ("start_date_contains", "03-02")],
        &options,
    );
    assert_eq!(matching_ids(&predicate, &sample_events()), vec!["e-1", "e-3"]);
}

#[test]
fn distinct_operator_groups_always_combine_with_and() {
    let options = RefineOptions {
        same_operator_mode: LogicalMode::Or,
        ..RefineOptions::default()
    };
    let predicate = predicate_for(&[("name_contains", "opening"), ("is_public", "true"), ("start_date_gte", "2024-03-02")], &options);
    assert_eq!(matching_ids(&predicate, &sample_events()), vec!["e-3"]);
}

#[test]
fn no_filters_match_everything() {
    let predicate = predicate_for(&[], &RefineOptions::default());
    assert_eq!(predicate, Predicate::Always);
    assert_eq!(matching_ids(&predicate, &sample_events()).len(), 3);
}

#[test]
fn parse_sort_defaults_missing_directions_to_ascending() {
    let keys = parse_sort(Some("name,start_date"), Some("DESC"));
    assert_eq!(
        keys,
        vec![
            SortKey {
                field: "name".to_owned(),
                direction: SortDirection::Desc
            },
            SortKey {
                field: "start_date".to_owned(),
                direction: SortDirection::Asc
            },
        ]
    );
    assert!(parse_sort(None, Some("asc")).is_empty());
}

#[test]
fn resolve_sort_skips_unknown_fields() {
    let keys = parse_sort(Some("color,start_date"), Some("asc,desc"));
    let resolved = resolve_sort(&keys, EntityKind::Events.schema());

    assert_eq!(
        resolved,
        vec![ResolvedSortKey {
            field: "start_date".to_owned(),
            field_type: FieldType::DateTime,
            direction: SortDirection::Desc,
        }]
    );
}

#[test]
fn apply_sort_orders_by_keys_then_id() {
    let mut records = sample_events();
    let keys = resolve_sort(
        &parse_sort(Some("is_public,start_date"), Some("desc,asc")),
        EntityKind::Events.schema(),
    );
    apply_sort(&mut records, &keys);

    let ids: Vec<&str> = records.iter().map(|record| record.record_id().as_str()).collect();
    assert_eq!(ids, vec!["e-1", "e-3", "e-2"]);
}

#[test]
fn apply_sort_places_missing_values_last_when_ascending() {
    let mut records = vec![
        event("b", json!({"name": "B"})),
        event("a", json!({"name": "A", "is_public": true})),
        event("c", json!({"name": "C", "is_public": false})),
    ];
    let keys = resolve_sort(&parse_sort(Some("is_public"), None), EntityKind::Events.schema());
    apply_sort(&mut records, &keys);

    let ids: Vec<&str> = records.iter().map(|record| record.record_id().as_str()).collect();
    assert_eq!(ids, vec!["c", "a", "b"]);
}

#[test]
fn pagination_defaults_to_first_ten() {
    let window = PaginationWindow::from_params(None, None, None, None);
    assert_eq!((window.offset(), window.limit()), (0, 10));
}

#[test]
fn explicit_bounds_take_precedence_over_pages() {
    let window = PaginationWindow::from_params(Some(5), Some(8), Some(4), Some(50));
    assert_eq!((window.offset(), window.limit()), (5, 3));
}

#[test]
fn page_encoding_matches_documented_example() {
    let window = PaginationWindow::from_page(3, 20);
    assert_eq!(window, PaginationWindow::from_bounds(40, 60));
    assert_eq!((window.offset(), window.limit()), (40, 20));
}

#[test]
fn degenerate_windows_are_clamped() {
    assert_eq!(PaginationWindow::from_bounds(10, 5).limit(), 1);
    assert_eq!(PaginationWindow::from_page(0, 10).offset(), 0);
    assert_eq!(PaginationWindow::from_page(2, 0).limit(), 1);
}

#[test]
fn huge_page_numbers_stay_within_signed_bounds() {
    let window = PaginationWindow::from_params(None, None, Some(i64::MAX), Some(1000));
    let (page, total) = apply_pagination(sample_events(), window);

    assert!(i64::try_from(window.offset()).is_ok());
    assert!(i64::try_from(window.limit()).is_ok());
    assert_eq!(window.offset(), PaginationWindow::MAX_BOUND);
    assert!(page.is_empty());
    assert_eq!(total, 3);
}

#[test]
fn offset_beyond_collection_yields_empty_page_with_total() {
    let (page, total) = apply_pagination(sample_events(), PaginationWindow::new(10, 5));
    assert!(page.is_empty());
    assert_eq!(total, 3);
}

#[test]
fn refine_query_reads_reserved_params() {
    let query = RefineQuery::from_params(
        &params(&[("currentPage", "2"), ("pageSize", "2"), ("_sort", "name"), ("_order", "desc")]),
        EntityKind::Events.schema(),
        &RefineOptions::default(),
    );

    assert_eq!(query.window, PaginationWindow::new(2, 2));
    assert_eq!(query.sort.len(), 1);
    assert_eq!(query.predicate, Predicate::Always);
}

#[test]
fn explicit_query_rejects_unknown_operator() {
    let query = ExplicitQuery {
        conditions: vec![ExplicitCondition {
            field: "name".to_owned(),
            operator: "between".to_owned(),
            value: RawValue::Single("a".to_owned()),
        }],
        sort: Vec::new(),
        window: PaginationWindow::default(),
    };

    let result = query.into_refine_query(EntityKind::Events.schema(), &RefineOptions::default());
    assert!(matches!(result, Err(AppError::UnsupportedOperator(name)) if name == "between"));
}

#[test]
fn explicit_query_drops_unknown_fields() {
    let query = ExplicitQuery {
        conditions: vec![ExplicitCondition {
            field: "color".to_owned(),
            operator: "eq".to_owned(),
            value: RawValue::Single("red".to_owned()),
        }],
        sort: Vec::new(),
        window: PaginationWindow::default(),
    };

    let result = query.into_refine_query(EntityKind::Events.schema(), &RefineOptions::default());
    assert!(matches!(result, Ok(query) if query.predicate == Predicate::Always));
}

#[derive(Default)]
struct FakeRecordRepository {
    records: RwLock<Vec<Record>>,
}

#[async_trait]
impl RecordRepository for FakeRecordRepository {
    async fn count_records(&self, kind: EntityKind, predicate: &Predicate) -> AppResult<u64> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|record| record.entity() == kind && predicate.matches(record))
            .count() as u64)
    }

    async fn fetch_records(
        &self,
        kind: EntityKind,
        predicate: &Predicate,
        sort: &[ResolvedSortKey],
        window: PaginationWindow,
    ) -> AppResult<Vec<Record>> {
        let mut matching: Vec<Record> = self
            .records
            .read()
            .await
            .iter()
            .filter(|record| record.entity() == kind && predicate.matches(record))
            .cloned()
            .collect();
        apply_sort(&mut matching, sort);
        Ok(apply_pagination(matching, window).0)
    }

    async fn find_record(&self, _kind: EntityKind, _record_id: &str) -> AppResult<Option<Record>> {
        Ok(None)
    }

    async fn insert_record(&self, record: Record) -> AppResult<()> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn update_record(&self, _record: Record) -> AppResult<()> {
        Ok(())
    }

    async fn delete_record(&self, _kind: EntityKind, _record_id: &str) -> AppResult<bool> {
        Ok(false)
    }
}

#[tokio::test]
async fn refine_returns_total_before_pagination() {
    let repository = Arc::new(FakeRecordRepository::default());
    for record in sample_events() {
        assert!(repository.insert_record(record).await.is_ok());
    }

    let query = RefineQuery::from_params(
        &params(&[("is_public", "true"), ("_start", "1"), ("_end", "2"), ("_sort", "start_date")]),
        EntityKind::Events.schema(),
        &RefineOptions::default(),
    );
    let page = refine(repository.as_ref(), EntityKind::Events, query).await;

    assert!(page.is_ok());
    let page = page.unwrap_or_else(|_| unreachable!());
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].record_id().as_str(), "e-3");
}

#[tokio::test]
async fn refine_scope_is_conjunctive() {
    let repository = Arc::new(FakeRecordRepository::default());
    for record in sample_events() {
        assert!(repository.insert_record(record).await.is_ok());
    }

    let query = RefineQuery::from_params(
        &params(&[("name_contains", "dinner")]),
        EntityKind::Events.schema(),
        &RefineOptions::default(),
    )
    .and_scope(Predicate::Compare {
        field: "is_public".to_owned(),
        field_type: FieldType::Boolean,
        operator: FilterOperator::Eq,
        value: TypedValue::Boolean(true),
        truncate_to_date: false,
    });
    let page = refine(repository.as_ref(), EntityKind::Events, query).await;

    assert!(matches!(page, Ok(page) if page.total == 0 && page.items.is_empty()));
}

proptest! {
    #[test]
    fn page_and_bound_encodings_agree(current_page in 1i64..10_000, page_size in 1i64..10_000) {
        let from_page = PaginationWindow::from_params(None, None, Some(current_page), Some(page_size));
        let from_bounds = PaginationWindow::from_params(
            Some((current_page - 1) * page_size),
            Some(current_page * page_size),
            None,
            None,
        );
        prop_assert_eq!(from_page, from_bounds);
    }

    #[test]
    fn windows_always_fit_signed_bounds(
        current_page in any::<i64>(),
        page_size in any::<i64>(),
        offset in any::<u64>(),
        limit in any::<u64>(),
    ) {
        for window in [
            PaginationWindow::from_page(current_page, page_size),
            PaginationWindow::from_bounds(current_page, page_size),
            PaginationWindow::new(offset, limit),
        ] {
            prop_assert!(i64::try_from(window.offset()).is_ok());
            prop_assert!(i64::try_from(window.limit()).is_ok());
        }
    }

    #[test]
    fn pagination_total_is_independent_of_window(len in 0usize..50, offset in 0u64..60, limit in 1u64..20) {
        let items: Vec<usize> = (0..len).collect();
        let (page, total) = apply_pagination(items, PaginationWindow::new(offset, limit));
        prop_assert_eq!(total, len as u64);
        prop_assert!(page.len() as u64 <= limit);
    }
}
