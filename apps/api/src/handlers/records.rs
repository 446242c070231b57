use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use congress_application::{
    ExplicitCondition, ExplicitQuery, PaginationWindow, QueryParams, RefinedPage, SortKey,
};
use congress_core::{AppError, Principal};
use congress_domain::{EntityKind, RawValue, Record, SortDirection};
use serde_json::Value;

use crate::dto::{QueryConditionRequest, QueryRecordsRequest, QuerySortRequest};
use crate::error::ApiResult;
use crate::handlers::total_count_headers;
use crate::state::AppState;

#[cfg(test)]
mod tests;

/// GET /api/{resource} - Suffix-encoded filters, sort and pagination.
pub async fn list_records_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(resource): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> ApiResult<(HeaderMap, Json<Vec<Value>>)> {
    let kind = EntityKind::parse_transport(&resource)?;
    let params = group_query_pairs(pairs);
    let page = state
        .record_service
        .list_records(&principal, kind, &params)
        .await?;

    Ok(page_response(page))
}

/// POST /api/{resource}/query - Conditions with explicitly named operators.
pub async fn query_records_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(resource): Path<String>,
    Json(payload): Json<QueryRecordsRequest>,
) -> ApiResult<(HeaderMap, Json<Vec<Value>>)> {
    let kind = EntityKind::parse_transport(&resource)?;
    let query = explicit_query_from_request(payload)?;
    let page = state
        .record_service
        .query_records(&principal, kind, query)
        .await?;

    Ok(page_response(page))
}

pub async fn get_record_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((resource, record_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let kind = EntityKind::parse_transport(&resource)?;
    let record = state
        .record_service
        .get_record(&principal, kind, &record_id)
        .await?;

    Ok(Json(record.to_document()))
}

pub async fn create_record_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(resource): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let kind = EntityKind::parse_transport(&resource)?;
    let record = state
        .record_service
        .create_record(&principal, kind, &payload)
        .await?;

    Ok((StatusCode::CREATED, Json(record.to_document())))
}

pub async fn update_record_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((resource, record_id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<Json<Value>> {
    let kind = EntityKind::parse_transport(&resource)?;
    let record = state
        .record_service
        .update_record(&principal, kind, &record_id, &payload)
        .await?;

    Ok(Json(record.to_document()))
}

pub async fn delete_record_handler(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path((resource, record_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind = EntityKind::parse_transport(&resource)?;
    state
        .record_service
        .delete_record(&principal, kind, &record_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Collapses repeated query names into one list value, keeping arrival order.
pub(crate) fn group_query_pairs(pairs: Vec<(String, String)>) -> QueryParams {
    let mut params = QueryParams::new();
    for (name, value) in pairs {
        match params.remove(&name) {
            None => {
                params.insert(name, RawValue::Single(value));
            }
            Some(RawValue::Single(first)) => {
                params.insert(name, RawValue::Many(vec![first, value]));
            }
            Some(RawValue::Many(mut values)) => {
                values.push(value);
                params.insert(name, RawValue::Many(values));
            }
        }
    }
    params
}

pub(crate) fn explicit_query_from_request(
    payload: QueryRecordsRequest,
) -> Result<ExplicitQuery, AppError> {
    let conditions = payload
        .conditions
        .into_iter()
        .map(|condition: QueryConditionRequest| {
            let value = RawValue::from_json(&condition.value).ok_or_else(|| {
                AppError::Validation(format!(
                    "value of condition on '{}' must be a scalar or a list of scalars",
                    condition.field
                ))
            })?;

            Ok(ExplicitCondition {
                field: condition.field,
                operator: condition.operator,
                value,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    let sort = payload
        .sort
        .into_iter()
        .map(|key: QuerySortRequest| SortKey {
            field: key.field,
            direction: key
                .direction
                .as_deref()
                .map(SortDirection::parse_lenient)
                .unwrap_or_default(),
        })
        .collect();

    Ok(ExplicitQuery {
        conditions,
        sort,
        window: PaginationWindow::from_params(
            payload.start,
            payload.end,
            payload.current_page,
            payload.page_size,
        ),
    })
}

fn page_response(page: RefinedPage<Record>) -> (HeaderMap, Json<Vec<Value>>) {
    let items = page.items.iter().map(Record::to_document).collect();
    (total_count_headers(page.total), Json(items))
}
