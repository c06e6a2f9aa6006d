//! Error types module
//!
//! All failures surfaced to a request are unified under [`AppError`]. Each variant
//! describes its own HTTP presentation through [`ErrorMetadata`], so the API crate
//! only has to render it.

use std::io;

use sqlx::Error as SqlxError;

use crate::validation::FieldErrors;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Expected errors like validation failures
    Debug,
    /// Recoverable issues, partial failures
    Warn,
    /// Unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "DATABASE_ERROR")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden from clients
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Database operation timed out: {0}")]
    Timeout(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict on value {value}")]
    Conflict { value: String },

    #[error("Validation failed: {0:?}")]
    FailedValidation(FieldErrors),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid authentication credentials")]
    InvalidCredentials,

    #[error("Inactive account")]
    InactiveAccount,

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// A failed write whose compensating cleanup also failed. Presented like the
    /// original error; the cleanup failure is kept for logs and notifications.
    #[error("{error}; compensation failed: {compensation}")]
    WithCompensation {
        #[source]
        error: Box<AppError>,
        compensation: String,
    },
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::RowNotFound => {
                AppError::NotFound("the requested resource could not be found".to_string())
            }
            other => AppError::Database(other),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

const SERVER_ERROR_MESSAGE: &str =
    "the server encountered a problem and could not process your request";

/// Static metadata for each variant: (http_status, error_code, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, LogLevel::Error),
        AppError::Timeout(_) => (500, "DATABASE_TIMEOUT", true, LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, LogLevel::Error),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, LogLevel::Debug),
        AppError::BadRequest(_) => (400, "BAD_REQUEST", false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::Conflict { .. } => (409, "CONFLICT", false, LogLevel::Debug),
        AppError::FailedValidation(_) => (422, "FAILED_VALIDATION", false, LogLevel::Debug),
        AppError::PayloadTooLarge(_) => (413, "PAYLOAD_TOO_LARGE", false, LogLevel::Debug),
        AppError::Unauthorized(_) => (401, "UNAUTHORIZED", false, LogLevel::Debug),
        AppError::InvalidCredentials => (401, "INVALID_CREDENTIALS", false, LogLevel::Debug),
        AppError::InactiveAccount => (403, "INACTIVE_ACCOUNT", false, LogLevel::Debug),
        AppError::TooManyRequests => (429, "RATE_LIMIT_EXCEEDED", false, LogLevel::Warn),
        AppError::Internal(_) => (500, "INTERNAL_ERROR", true, LogLevel::Error),
        AppError::InternalWithSource { .. } => (500, "INTERNAL_ERROR", true, LogLevel::Error),
        AppError::WithCompensation { error, .. } => {
            let (status, code, sensitive, _) = app_error_static_metadata(error);
            (status, code, sensitive, LogLevel::Error)
        }
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Timeout(_) => "Timeout",
            AppError::Storage(_) => "Storage",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::BadRequest(_) => "BadRequest",
            AppError::NotFound(_) => "NotFound",
            AppError::Conflict { .. } => "Conflict",
            AppError::FailedValidation(_) => "FailedValidation",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::InvalidCredentials => "InvalidCredentials",
            AppError::InactiveAccount => "InactiveAccount",
            AppError::TooManyRequests => "TooManyRequests",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
            AppError::WithCompensation { error, .. } => error.error_type(),
        }
    }

    /// Field-addressable validation messages, when this is a validation failure.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            AppError::FailedValidation(errors) => Some(errors),
            AppError::WithCompensation { error, .. } => error.field_errors(),
            _ => None,
        }
    }

    /// Attach a failed compensation step to this error.
    pub fn with_compensation(self, compensation: impl Into<String>) -> Self {
        AppError::WithCompensation {
            error: Box::new(self),
            compensation: compensation.into(),
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_)
            | AppError::Timeout(_)
            | AppError::Storage(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => SERVER_ERROR_MESSAGE.to_string(),
            AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::BadRequest(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Conflict { value } => {
                format!("A resource with the same identifier ({})", value)
            }
            AppError::FailedValidation(errors) => errors
                .iter()
                .map(|(field, msg)| format!("{}: {}", field, msg))
                .collect::<Vec<_>>()
                .join("; "),
            AppError::PayloadTooLarge(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::InvalidCredentials => "invalid authentication credentials".to_string(),
            AppError::InactiveAccount => {
                "your user account must be activated to access this resource".to_string()
            }
            AppError::TooManyRequests => "rate limit exceeded".to_string(),
            AppError::WithCompensation { error, .. } => error.client_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert_eq!(err.client_message(), SERVER_ERROR_MESSAGE);
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = AppError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(
            err.client_message(),
            "the requested resource could not be found"
        );
    }

    #[test]
    fn test_conflict_names_the_value() {
        let err = AppError::Conflict {
            value: "Manicure".to_string(),
        };
        assert_eq!(err.http_status_code(), 409);
        assert_eq!(
            err.client_message(),
            "A resource with the same identifier (Manicure)"
        );
        assert!(!err.is_sensitive());
    }

    #[test]
    fn test_failed_validation_exposes_fields() {
        let mut errors = FieldErrors::new();
        errors.insert("title".to_string(), "title must be provided".to_string());
        let err = AppError::FailedValidation(errors);
        assert_eq!(err.http_status_code(), 422);
        assert_eq!(
            err.field_errors().and_then(|e| e.get("title")).map(String::as_str),
            Some("title must be provided")
        );
    }

    #[test]
    fn test_compensation_keeps_original_presentation() {
        let err = AppError::Conflict {
            value: "Manicure".to_string(),
        }
        .with_compensation("delete of photo abc.png failed");

        assert_eq!(err.http_status_code(), 409);
        assert_eq!(err.error_code(), "CONFLICT");
        assert_eq!(err.log_level(), LogLevel::Error);
        assert!(err.to_string().contains("compensation failed"));
        assert!(err.to_string().contains("abc.png"));
        assert!(!err.client_message().contains("abc.png"));
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Storage("connection reset by peer".to_string());
        assert!(err.is_sensitive());
        assert!(!err.client_message().contains("connection reset"));
    }
}
