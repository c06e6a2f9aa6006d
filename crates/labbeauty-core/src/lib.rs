//! LabBeauty Core Library
//!
//! This crate provides the domain models, error types, configuration, and validation
//! shared by the storage, database, and API crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;
pub mod validation;

// Re-export commonly used types
pub use config::{BaseConfig, CatalogConfig, Config};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Category, ContactForm, MediaRef, PhotoRecord, Service, SubCategory, User};
pub use storage_types::StorageBackend;
pub use validation::{FieldErrors, Validator};
