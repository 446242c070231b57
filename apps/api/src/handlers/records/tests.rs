use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use congress_core::Principal;
use congress_domain::{RawValue, SortDirection};
use proptest::prelude::*;
use serde_json::json;

use crate::dto::{QueryConditionRequest, QueryRecordsRequest, QuerySortRequest};
use crate::state::AppState;
use crate::test_support::memory_state;

use super::{
    create_record_handler, delete_record_handler, explicit_query_from_request,
    group_query_pairs, list_records_handler, query_records_handler,
};

fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
    values
        .iter()
        .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
        .collect()
}

async fn seed_countries(state: &AppState, admin: &Principal) {
    for (name, code2, code3) in [
        ("Peru", "PE", "PER"),
        ("Chile", "CL", "CHL"),
        ("Brazil", "BR", "BRA"),
    ] {
        let created = create_record_handler(
            State(state.clone()),
            Extension(admin.clone()),
            Path("countries".to_owned()),
            Json(json!({"name": name, "code2": code2, "code3": code3})),
        )
        .await;
        assert!(matches!(created, Ok((StatusCode::CREATED, _))));
    }
}

#[test]
fn repeated_names_become_lists() {
    let params = group_query_pairs(pairs(&[
        ("name_contains", "a"),
        ("id_in", "1"),
        ("id_in", "2"),
        ("id_in", "3"),
    ]));

    assert_eq!(
        params.get("name_contains"),
        Some(&RawValue::Single("a".to_owned()))
    );
    assert_eq!(
        params.get("id_in"),
        Some(&RawValue::Many(vec![
            "1".to_owned(),
            "2".to_owned(),
            "3".to_owned()
        ]))
    );
}

proptest! {
    #[test]
    fn grouping_keeps_every_value(values in proptest::collection::vec(("[a-c]", "[0-9]{1,3}"), 0..24)) {
        let params = group_query_pairs(values.clone());
        let grouped: usize = params
            .values()
            .map(|value| match value {
                RawValue::Single(_) => 1,
                RawValue::Many(items) => items.len(),
            })
            .sum();

        prop_assert_eq!(grouped, values.len());
    }
}

#[test]
fn explicit_request_rejects_object_values() {
    let result = explicit_query_from_request(QueryRecordsRequest {
        conditions: vec![QueryConditionRequest {
            field: "name".to_owned(),
            operator: "eq".to_owned(),
            value: json!({"nested": true}),
        }],
        ..QueryRecordsRequest::default()
    });

    assert!(result.is_err());
}

#[test]
fn explicit_request_maps_sort_and_window() {
    let query = explicit_query_from_request(QueryRecordsRequest {
        sort: vec![QuerySortRequest {
            field: "name".to_owned(),
            direction: Some("desc".to_owned()),
        }],
        current_page: Some(3),
        page_size: Some(5),
        ..QueryRecordsRequest::default()
    })
    .unwrap_or_else(|_| unreachable!());

    assert_eq!(query.sort[0].direction, SortDirection::Desc);
    assert_eq!(query.window.offset(), 10);
    assert_eq!(query.window.limit(), 5);
}

#[tokio::test]
async fn list_sets_total_count_and_pages() {
    let (state, admin) = memory_state().await;
    seed_countries(&state, &admin).await;

    let (headers, Json(items)) = list_records_handler(
        State(state),
        Extension(Principal::Guest),
        Path("countries".to_owned()),
        Query(pairs(&[("_sort", "name"), ("_start", "0"), ("_end", "2")])),
    )
    .await
    .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        headers.get("x-total-count").and_then(|value| value.to_str().ok()),
        Some("3")
    );
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["name"], "Brazil");
    assert_eq!(items[1]["name"], "Chile");
}

#[tokio::test]
async fn explicit_query_filters_with_named_operators() {
    let (state, admin) = memory_state().await;
    seed_countries(&state, &admin).await;

    let (headers, Json(items)) = query_records_handler(
        State(state),
        Extension(Principal::Guest),
        Path("countries".to_owned()),
        Json(QueryRecordsRequest {
            conditions: vec![QueryConditionRequest {
                field: "code2".to_owned(),
                operator: "in".to_owned(),
                value: json!(["PE", "CL"]),
            }],
            ..QueryRecordsRequest::default()
        }),
    )
    .await
    .unwrap_or_else(|_| unreachable!());

    assert_eq!(
        headers.get("x-total-count").and_then(|value| value.to_str().ok()),
        Some("2")
    );
    assert_eq!(items.len(), 2);
}

#[tokio::test]
async fn unsupported_operator_is_a_bad_request() {
    let (state, _) = memory_state().await;

    let result = query_records_handler(
        State(state),
        Extension(Principal::Guest),
        Path("countries".to_owned()),
        Json(QueryRecordsRequest {
            conditions: vec![QueryConditionRequest {
                field: "name".to_owned(),
                operator: "regex".to_owned(),
                value: json!("^P"),
            }],
            ..QueryRecordsRequest::default()
        }),
    )
    .await;

    let status = result.map(|_| StatusCode::OK).unwrap_or_else(|error| error.into_response().status());
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn guests_cannot_write_and_unknown_resources_are_missing() {
    let (state, _) = memory_state().await;

    let guest_create = create_record_handler(
        State(state.clone()),
        Extension(Principal::Guest),
        Path("countries".to_owned()),
        Json(json!({"name": "Peru", "code2": "PE", "code3": "PER"})),
    )
    .await;
    let unknown = delete_record_handler(
        State(state),
        Extension(Principal::Guest),
        Path(("spaceships".to_owned(), "1".to_owned())),
    )
    .await;

    let status_of = |result: Result<StatusCode, crate::error::ApiError>| {
        result.unwrap_or_else(|error| error.into_response().status())
    };
    assert_eq!(
        status_of(guest_create.map(|(status, _)| status)),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(status_of(unknown), StatusCode::NOT_FOUND);
}
