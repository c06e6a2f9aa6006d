use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use labbeauty_core::AppError;
use std::sync::Arc;

use super::session::{session_token, SessionKeys};
use crate::error::HttpAppError;

const AUTH_REQUIRED: &str = "you must be authenticated to access this resource";

/// Reject requests without a valid session cookie. On success the
/// [`SessionClaims`](super::SessionClaims) are added to the request extensions.
pub async fn require_session(
    State(keys): State<Arc<SessionKeys>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(session_token)
        .map(str::to_string);

    let Some(token) = token else {
        return HttpAppError(AppError::Unauthorized(AUTH_REQUIRED.to_string())).into_response();
    };

    match keys.verify(&token) {
        Ok(claims) => {
            tracing::debug!(user_id = claims.sub, "Session accepted");
            request.extensions_mut().insert(claims);
            next.run(request).await
        }
        Err(e) => HttpAppError(e).into_response(),
    }
}
