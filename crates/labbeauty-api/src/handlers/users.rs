//! Operator accounts and sessions

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    response::IntoResponse,
    Json,
};
use labbeauty_core::validation::{validate_email, validate_password_plaintext, validate_user_name};
use labbeauty_core::{AppError, Validator};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Create an activated operator account. Requires a session.
#[tracing::instrument(skip_all)]
pub async fn register_user(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<RegisterInput>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut v = Validator::new();
    validate_user_name(&mut v, &input.name);
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    v.finish()?;

    let password_hash = hash_password(&input.password)?;
    let user = match state
        .users
        .insert(&input.name, &input.email, &password_hash, true)
        .await
    {
        Ok(user) => user,
        Err(AppError::Conflict { .. }) => {
            let mut v = Validator::new();
            v.add_error("email", "a user with this email address already exists");
            return Err(AppError::FailedValidation(v.errors().clone()).into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

/// Check credentials and set the session cookie.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidatedJson(input): ValidatedJson<LoginInput>,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    v.finish()?;

    let user = state
        .users
        .get_by_email(&input.email)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !user.activated {
        return Err(AppError::InactiveAccount.into());
    }
    if !verify_password(&input.password, &user.password_hash)? {
        return Err(AppError::InvalidCredentials.into());
    }

    let token = state.sessions.issue(&user)?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok((
        [(SET_COOKIE, state.sessions.cookie(&token))],
        Json(json!({ "login": "successful" })),
    ))
}

/// Expire the session cookie.
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(SET_COOKIE, state.sessions.expired_cookie())],
        Json(json!({ "logout": "successful" })),
    )
}
