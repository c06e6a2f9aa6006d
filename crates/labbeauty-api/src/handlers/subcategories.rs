//! Subcategory handlers (JSON bodies, no photo)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use labbeauty_core::validation::validate_subcategory;
use labbeauty_core::{SubCategory, Validator};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use super::{location, read_id_param};
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubCategoryInput {
    #[serde(default)]
    pub name: String,
}

#[tracing::instrument(skip(state))]
pub async fn list_subcategories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpAppError> {
    let subcategories = state.subcategories.list().await?;
    Ok(Json(json!({ "sub_categories": subcategories })))
}

#[tracing::instrument(skip(state))]
pub async fn get_subcategory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = read_id_param(&id)?;
    let subcategory = state.subcategories.get(id).await?;
    Ok(Json(json!({ "subcategory": subcategory })))
}

#[tracing::instrument(skip(state))]
pub async fn create_subcategory(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<SubCategoryInput>,
) -> Result<impl IntoResponse, HttpAppError> {
    let subcategory = SubCategory {
        id: 0,
        name: input.name,
    };
    let mut v = Validator::new();
    validate_subcategory(&mut v, &subcategory);
    v.finish()?;

    let saved = state.subcategories.insert(&subcategory.name).await?;
    Ok((
        StatusCode::CREATED,
        location("/subcategories", saved.id),
        Json(json!({ "subcategory": saved })),
    ))
}

/// Replaces the name.
#[tracing::instrument(skip(state))]
pub async fn update_subcategory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(input): ValidatedJson<SubCategoryInput>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = read_id_param(&id)?;
    let mut subcategory = state.subcategories.get(id).await?;
    subcategory.name = input.name;

    let mut v = Validator::new();
    validate_subcategory(&mut v, &subcategory);
    v.finish()?;

    let saved = state.subcategories.update(&subcategory).await?;
    Ok(Json(json!({ "subcategory": saved })))
}

#[tracing::instrument(skip(state))]
pub async fn delete_subcategory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    let id = read_id_param(&id)?;
    state.subcategories.delete(id).await?;
    Ok(Json(json!({ "message": "subcategory successfully deleted" })))
}
