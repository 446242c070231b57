use serde::Deserialize;
use serde_json::Value;
use ts_rs::TS;

/// One condition of an explicit record query.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/query-condition-request.ts"
)]
pub struct QueryConditionRequest {
    pub field: String,
    pub operator: String,
    #[ts(type = "string | number | boolean | Array<string | number | boolean>")]
    pub value: Value,
}

/// One sort key of an explicit record query.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/query-sort-request.ts"
)]
pub struct QuerySortRequest {
    pub field: String,
    pub direction: Option<String>,
}

/// Incoming payload for explicit record queries.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/query-records-request.ts"
)]
pub struct QueryRecordsRequest {
    #[serde(default)]
    pub conditions: Vec<QueryConditionRequest>,
    #[serde(default)]
    pub sort: Vec<QuerySortRequest>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub current_page: Option<i64>,
    pub page_size: Option<i64>,
}
