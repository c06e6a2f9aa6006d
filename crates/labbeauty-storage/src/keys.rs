//! Object name generation.
//!
//! Names are `{uuid v4}{ext}` where `ext` is the lowercased extension of the uploaded
//! file. Only image extensions from the allow-list are accepted.

use labbeauty_core::constants::ALLOWED_IMAGE_EXTENSIONS;
use uuid::Uuid;

use crate::{StorageError, StorageResult};

/// Lowercased extension of `filename` including the dot, if it is an allowed image type.
pub fn normalized_extension(filename: &str) -> StorageResult<String> {
    let ext = std::path::Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default();

    if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else if ext.is_empty() {
        Err(StorageError::UnsupportedExtension(format!(
            "file {} has no extension; allowed: {}",
            filename,
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        )))
    } else {
        Err(StorageError::UnsupportedExtension(format!(
            "{} is not an image; allowed: {}",
            ext,
            ALLOWED_IMAGE_EXTENSIONS.join(", ")
        )))
    }
}

/// Generate a fresh object name for an uploaded file. Pure apart from the random token.
pub fn generate_object_name(filename: &str) -> StorageResult<String> {
    let ext = normalized_extension(filename)?;
    Ok(format!("{}{}", Uuid::new_v4(), ext))
}
