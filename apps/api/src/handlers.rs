pub mod health;
pub mod records;
pub mod security;

use axum::http::header::{ACCESS_CONTROL_EXPOSE_HEADERS, HeaderName};
use axum::http::{HeaderMap, HeaderValue};

const TOTAL_COUNT_HEADER: &str = "x-total-count";

/// Headers carrying the pre-pagination total of a list response.
fn total_count_headers(total: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        HeaderName::from_static(TOTAL_COUNT_HEADER),
        HeaderValue::from(total),
    );
    headers.insert(
        ACCESS_CONTROL_EXPOSE_HEADERS,
        HeaderValue::from_static("X-Total-Count"),
    );
    headers
}
