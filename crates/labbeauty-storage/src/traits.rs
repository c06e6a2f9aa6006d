//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use thiserror::Error;

/// Which side of a dual write an error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOperation {
    Upload,
    Delete,
}

impl fmt::Display for StorageOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageOperation::Upload => write!(f, "upload"),
            StorageOperation::Delete => write!(f, "delete"),
        }
    }
}

/// Storage operation errors
///
/// Cloneable so a single outcome can be observed by several waiters.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("failed to {operation} a blob after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: StorageOperation,
        attempts: u32,
        last: Box<StorageError>,
    },
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err.to_string())
    }
}

impl StorageError {
    /// Whether another attempt could succeed. Missing objects and bad input never do.
    pub fn is_transient(&self) -> bool {
        !matches!(
            self,
            StorageError::NotFound(_)
                | StorageError::InvalidKey(_)
                | StorageError::UnsupportedExtension(_)
                | StorageError::ConfigError(_)
                | StorageError::RetriesExhausted { .. }
        )
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage abstraction trait
///
/// Writes are overwrite-by-name: uploading to an existing key replaces the object.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` under `key`.
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    /// Remove the object under `key`. Backends report a missing object as
    /// [`StorageError::NotFound`] when they can tell.
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Publicly resolvable URL for `key`.
    fn public_url(&self, key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}

/// Join a base endpoint, an optional container, and a key with single slashes.
pub(crate) fn compose_url(base: &str, container: Option<&str>, key: &str) -> String {
    let base = base.trim_end_matches('/');
    match container.map(|c| c.trim_matches('/')).filter(|c| !c.is_empty()) {
        Some(container) => format!("{}/{}/{}", base, container, key),
        None => format!("{}/{}", base, key),
    }
}
