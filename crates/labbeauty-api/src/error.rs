//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Anything convertible into
//! [`AppError`] becomes an [`HttpAppError`] and renders as `{"error": ...}` with the
//! status, code, and log level the error describes.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use labbeauty_core::constants::MAX_JSON_BYTES;
use labbeauty_core::{AppError, ErrorMetadata, LogLevel};
use labbeauty_storage::StorageError;
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// A message string, or a `field -> message` map for validation failures.
    pub error: serde_json::Value,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: serde_json::Value::String(error.into()),
            code: code.into(),
            details: None,
            error_type: None,
        }
    }
}

/// Wrapper type for AppError to implement IntoResponse
/// This is necessary because of Rust's orphan rules - we can't implement
/// IntoResponse (external trait) for AppError (external type from labbeauty-core)
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::from(err))
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        HttpAppError(storage_to_app_error(err))
    }
}

pub fn storage_to_app_error(err: StorageError) -> AppError {
    match err {
        StorageError::UnsupportedExtension(msg) => {
            AppError::BadRequest(format!("unsupported media type: {}", msg))
        }
        StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
        StorageError::NotFound(msg) => AppError::NotFound(msg),
        other => AppError::Storage(other.to_string()),
    }
}

/// JSON body extractor with strict decoding.
///
/// Bodies over 1 MiB, empty bodies, trailing values, and malformed or mistyped JSON
/// are rejected with a 400 that says what was wrong. Unknown keys are rejected when
/// the target type uses `#[serde(deny_unknown_fields)]`.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state).await.map_err(|rejection| {
            if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                HttpAppError(AppError::PayloadTooLarge(format!(
                    "body must not be larger than {} bytes",
                    MAX_JSON_BYTES
                )))
            } else {
                HttpAppError(AppError::BadRequest(rejection.body_text()))
            }
        })?;

        decode_json(&body).map(ValidatedJson).map_err(HttpAppError)
    }
}

/// Decode a single JSON value from `body`, mapping serde errors to client messages.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    if body.len() > MAX_JSON_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "body must not be larger than {} bytes",
            MAX_JSON_BYTES
        )));
    }
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AppError::BadRequest("body must not be empty".to_string()));
    }

    let mut de = serde_json::Deserializer::from_slice(body);
    let value = T::deserialize(&mut de).map_err(|e| json_error(body, e))?;
    if de.end().is_err() {
        return Err(AppError::BadRequest(
            "body must only contain a single JSON value".to_string(),
        ));
    }
    Ok(value)
}

fn json_error(body: &[u8], err: serde_json::Error) -> AppError {
    use serde_json::error::Category;

    let message = err.to_string();
    let text = match err.classify() {
        Category::Syntax => format!(
            "body contains badly-formed JSON (at character {})",
            byte_offset(body, err.line(), err.column())
        ),
        Category::Eof => "body contains badly-formed JSON".to_string(),
        Category::Data => {
            if let Some(field) = quoted_after(&message, "unknown field ") {
                format!("body contains unknown key \"{}\"", field)
            } else if let Some(field) = quoted_after(&message, "missing field ") {
                format!("body is missing field \"{}\"", field)
            } else if message.starts_with("invalid type") {
                "body contains incorrect JSON type".to_string()
            } else {
                format!("body contains invalid JSON: {}", message)
            }
        }
        Category::Io => format!("failed to read body: {}", message),
    };
    AppError::BadRequest(text)
}

/// First backtick-quoted name following `prefix`, as serde reports field names.
fn quoted_after<'a>(message: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = &message[message.find(prefix)? + prefix.len()..];
    let rest = rest.strip_prefix('`')?;
    rest.find('`').map(|end| &rest[..end])
}

fn byte_offset(body: &[u8], line: usize, column: usize) -> usize {
    let preceding: usize = body
        .split(|b| *b == b'\n')
        .take(line.saturating_sub(1))
        .map(|l| l.len() + 1)
        .sum();
    preceding + column
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let error = match app_error.field_errors() {
            Some(fields) => serde_json::to_value(fields)
                .unwrap_or_else(|_| serde_json::Value::String(app_error.client_message())),
            None => serde_json::Value::String(app_error.client_message()),
        };

        // Details are never shown in production or for sensitive errors.
        let show_details = !is_production_env() && !app_error.is_sensitive();
        let body = ErrorResponse {
            error,
            code: app_error.error_code().to_string(),
            details: show_details.then(|| app_error.detailed_message()),
            error_type: show_details.then(|| app_error.error_type().to_string()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Input {
        name: String,
    }

    fn message(err: AppError) -> String {
        match err {
            AppError::BadRequest(msg) | AppError::PayloadTooLarge(msg) => msg,
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn decodes_a_single_value() {
        let input: Input = decode_json(br#"{"name": "Nail care"}"#).unwrap();
        assert_eq!(input.name, "Nail care");
    }

    #[test]
    fn empty_body_is_rejected() {
        let err = decode_json::<Input>(b"  ").unwrap_err();
        assert_eq!(message(err), "body must not be empty");
    }

    #[test]
    fn unknown_key_is_named() {
        let err = decode_json::<Input>(br#"{"name": "x", "admin": true}"#).unwrap_err();
        assert_eq!(message(err), "body contains unknown key \"admin\"");
    }

    #[test]
    fn trailing_value_is_rejected() {
        let err = decode_json::<Input>(br#"{"name": "x"}{"name": "y"}"#).unwrap_err();
        assert_eq!(message(err), "body must only contain a single JSON value");
    }

    #[test]
    fn syntax_error_reports_position() {
        let err = decode_json::<Input>(br#"{"name" "x"}"#).unwrap_err();
        assert!(message(err).starts_with("body contains badly-formed JSON (at character"));
    }

    #[test]
    fn oversized_body_is_rejected() {
        let body = vec![b' '; MAX_JSON_BYTES + 1];
        let err = decode_json::<Input>(&body).unwrap_err();
        assert!(matches!(err, AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn unsupported_extension_is_a_bad_request() {
        let err = storage_to_app_error(StorageError::UnsupportedExtension(".txt".to_string()));
        assert_eq!(err.http_status_code(), 400);
    }
}
