//! Service handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use labbeauty_core::models::ServicePatch;
use labbeauty_core::Service;
use serde_json::json;
use std::sync::Arc;

use super::{location, read_id_param};
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_catalog_form;

#[tracing::instrument(skip(state))]
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let services = state.services.list().await?;
    Ok(Json(json!({ "services": services })))
}

#[tracing::instrument(skip(state))]
pub async fn get_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = read_id_param(&id)?;
    let service = state.services.get(id).await?;
    Ok(Json(json!({ "service": service })))
}

/// Multipart fields: `title`, `description`, `url` (booking page), and the `photo` file.
#[tracing::instrument(skip(state, multipart))]
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = extract_catalog_form(multipart).await?;
    let service = Service::new(
        form.text_or_empty("title"),
        form.text_or_empty("description"),
        form.text_or_empty("url"),
    );

    let saved = state
        .media
        .create(state.services.as_ref(), service, form.photo)
        .await?;

    Ok((
        StatusCode::CREATED,
        location("/services", saved.id),
        Json(json!({ "service": saved })),
    ))
}

/// Partial update; fields left out or empty keep their value.
#[tracing::instrument(skip(state, multipart))]
pub async fn update_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = read_id_param(&id)?;
    let form = extract_catalog_form(multipart).await?;
    let patch = ServicePatch {
        title: form.text("title"),
        description: form.text("description"),
        url: form.text("url"),
    };

    let saved = state
        .media
        .update(state.services.as_ref(), id, form.photo, |s| patch.apply(s))
        .await?;

    Ok(Json(json!({ "service": saved })))
}

#[tracing::instrument(skip(state))]
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = read_id_param(&id)?;
    state
        .media
        .delete(state.services.as_ref(), id)
        .await?;
    Ok(Json(json!({ "message": "service successfully deleted" })))
}
