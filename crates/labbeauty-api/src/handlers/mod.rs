//! HTTP handlers
//!
//! Responses wrap their payload in a single-key envelope such as
//! `{"category": {...}}`; errors render as `{"error": ...}` via
//! [`HttpAppError`](crate::error::HttpAppError).

pub mod categories;
pub mod contact;
pub mod health;
pub mod services;
pub mod subcategories;
pub mod users;

use axum::http::{header::LOCATION, HeaderMap, HeaderValue};
use labbeauty_core::AppError;

/// Parse a path id. Anything that is not a positive integer is reported as not found.
pub(crate) fn read_id_param(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id >= 1 => Ok(id),
        _ => Err(AppError::NotFound(
            "the requested resource could not be found".to_string(),
        )),
    }
}

/// `Location` header pointing at a newly created resource.
pub(crate) fn location(collection: &str, id: i64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&format!("{}/{}", collection, id)) {
        headers.insert(LOCATION, value);
    }
    headers
}
