//! Category handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use labbeauty_core::models::CategoryPatch;
use labbeauty_core::Category;
use serde_json::json;
use std::sync::Arc;

use super::{location, read_id_param};
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::extract_catalog_form;

#[tracing::instrument(skip(state))]
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let categories = state.categories.list().await?;
    Ok(Json(json!({ "categories": categories })))
}

#[tracing::instrument(skip(state))]
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = read_id_param(&id)?;
    let category = state.categories.get(id).await?;
    Ok(Json(json!({ "category": category })))
}

/// Multipart fields: `title`, `description`, and the `photo` file.
#[tracing::instrument(skip(state, multipart))]
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let form = extract_catalog_form(multipart).await?;
    let category = Category::new(form.text_or_empty("title"), form.text_or_empty("description"));

    let saved = state
        .media
        .create(state.categories.as_ref(), category, form.photo)
        .await?;

    Ok((
        StatusCode::CREATED,
        location("/categories", saved.id),
        Json(json!({ "category": saved })),
    ))
}

/// Partial update; fields left out or empty keep their value.
#[tracing::instrument(skip(state, multipart))]
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = read_id_param(&id)?;
    let form = extract_catalog_form(multipart).await?;
    let patch = CategoryPatch {
        title: form.text("title"),
        description: form.text("description"),
    };

    let saved = state
        .media
        .update(state.categories.as_ref(), id, form.photo, |c| patch.apply(c))
        .await?;

    Ok(Json(json!({ "category": saved })))
}

#[tracing::instrument(skip(state))]
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = read_id_param(&id)?;
    state
        .media
        .delete(state.categories.as_ref(), id)
        .await?;
    Ok(Json(json!({ "message": "category successfully deleted" })))
}
