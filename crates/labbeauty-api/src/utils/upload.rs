//! Multipart parsing for catalog writes

use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::http::StatusCode;
use labbeauty_core::constants::MAX_MULTIPART_BYTES;
use labbeauty_core::AppError;
use std::collections::HashMap;

use crate::services::PhotoUpload;

/// Name of the file field carrying the photo.
pub const PHOTO_FIELD: &str = "photo";

/// Text fields and the optional photo of a multipart form.
#[derive(Debug, Default)]
pub struct CatalogForm {
    fields: HashMap<String, String>,
    pub photo: Option<PhotoUpload>,
}

impl CatalogForm {
    /// Field value, `None` when absent.
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields.get(name).cloned()
    }

    /// Field value, empty when absent.
    pub fn text_or_empty(&self, name: &str) -> String {
        self.text(name).unwrap_or_default()
    }
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(format!(
            "body must not be larger than {} bytes",
            MAX_MULTIPART_BYTES
        ))
    } else {
        AppError::BadRequest(format!("failed to read multipart form: {}", err.body_text()))
    }
}

/// Read every field of `multipart`. Only one photo is accepted; an empty file part
/// counts as no photo.
pub async fn extract_catalog_form(mut multipart: Multipart) -> Result<CatalogForm, AppError> {
    let mut form = CatalogForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().map(|s| s.to_string()).unwrap_or_default();

        if field_name == PHOTO_FIELD {
            if form.photo.is_some() {
                return Err(AppError::BadRequest(
                    "only one photo may be uploaded per request".to_string(),
                ));
            }
            let filename = field.file_name().map(|s| s.to_string()).unwrap_or_default();
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let data = field.bytes().await.map_err(multipart_error)?;

            if !data.is_empty() {
                form.photo = Some(PhotoUpload {
                    filename,
                    content_type,
                    data,
                });
            }
        } else if !field_name.is_empty() {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(field_name, value);
        }
    }

    Ok(form)
}
