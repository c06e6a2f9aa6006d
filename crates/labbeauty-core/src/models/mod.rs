//! Domain models
//!
//! Catalog entities, users, and the contact form. Categories and services carry a
//! photo and implement [`PhotoRecord`] so the upload coordinator can treat them
//! uniformly.

pub mod category;
pub mod contact;
pub mod media;
pub mod service;
pub mod subcategory;
pub mod user;

pub use category::{Category, CategoryPatch};
pub use contact::ContactForm;
pub use media::{MediaRef, PhotoRecord};
pub use service::{Service, ServicePatch};
pub use subcategory::SubCategory;
pub use user::User;

/// Overwrite `field` when `value` carries a non-empty string.
pub(crate) fn patch_field(field: &mut String, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        *field = value;
    }
}
