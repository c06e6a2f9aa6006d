use axum::{extract::State, response::IntoResponse, Json};
use labbeauty_core::validation::validate_contact_form;
use labbeauty_core::{AppError, ContactForm, Validator};
use serde_json::json;
use std::sync::Arc;

use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

/// Relay a visitor's contact request to the salon's bot.
#[tracing::instrument(skip(state, form))]
pub async fn send_contact_form(
    State(state): State<Arc<AppState>>,
    ValidatedJson(form): ValidatedJson<ContactForm>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut v = Validator::new();
    validate_contact_form(&mut v, &form);
    v.finish()?;

    state
        .notifier
        .send(&form.to_message())
        .await
        .map_err(|e| AppError::InternalWithSource {
            message: "failed to relay contact form".to_string(),
            source: e,
        })?;

    tracing::info!("Contact form relayed");
    Ok(Json(json!({ "message": "sent" })))
}
