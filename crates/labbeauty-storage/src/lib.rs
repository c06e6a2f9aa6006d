//! LabBeauty Storage Library
//!
//! Object storage for catalog photos: the [`Storage`] trait, cloud backends built on
//! `object_store` (Azure Blob, S3, in-memory), a local filesystem backend, and the
//! [`RetryingStorage`] wrapper every backend is served through.
//!
//! # Object names
//!
//! Objects are stored flat under the container as `{uuid}{ext}`. Names are produced by
//! [`generate_object_name`] and never derived from the uploaded filename beyond its
//! extension. Public URLs are `{base endpoint}/{container}/{name}`.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-object-store")]
pub mod object_store_backend;
pub mod retry;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_storage, StorageSettings};
pub use keys::{generate_object_name, normalized_extension};
pub use labbeauty_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-object-store")]
pub use object_store_backend::ObjectStoreStorage;
pub use retry::{RetryPolicy, RetryingStorage};
pub use traits::{Storage, StorageError, StorageOperation, StorageResult};
