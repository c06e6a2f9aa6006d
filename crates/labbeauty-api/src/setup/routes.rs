//! Route configuration and setup

use crate::auth::require_session;
use crate::error::ErrorResponse;
use crate::handlers::{categories, contact, health, services, subcategories, users};
use crate::middleware::{rate_limit_middleware, security_headers_middleware, HttpRateLimiter};
use crate::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, OriginalUri},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use labbeauty_core::constants::MAX_MULTIPART_BYTES;
use labbeauty_core::Config;
use std::any::Any;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any as AnyOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Headroom for multipart framing on top of the photo itself.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// HTTP-level settings taken from [`Config`].
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub cors_origins: Vec<String>,
    pub limiter_enabled: bool,
    pub limiter_rps: f64,
    pub limiter_burst: u32,
}

impl HttpSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            cors_origins: config.cors_origins().to_vec(),
            limiter_enabled: config.limiter_enabled(),
            limiter_rps: config.limiter_rps(),
            limiter_burst: config.limiter_burst(),
        }
    }
}

/// Setup all application routes
pub fn setup_routes(state: Arc<AppState>, settings: &HttpSettings) -> Router {
    let rate_limiter = Arc::new(HttpRateLimiter::new(
        settings.limiter_rps,
        settings.limiter_burst,
        settings.limiter_enabled,
    ));
    tracing::info!(
        enabled = settings.limiter_enabled,
        rps = settings.limiter_rps,
        burst = settings.limiter_burst,
        "Rate limiter configured"
    );

    let app = public_routes()
        .merge(protected_routes(state.clone()))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(DefaultBodyLimit::max(MAX_MULTIPART_BYTES))
        .layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(handle_panic))
                .layer(TraceLayer::new_for_http())
                .layer(setup_cors(&settings.cors_origins))
                .layer(axum::middleware::from_fn(security_headers_middleware))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limiter,
                    rate_limit_middleware,
                ))
                .layer(RequestBodyLimitLayer::new(
                    MAX_MULTIPART_BYTES + MULTIPART_OVERHEAD_BYTES,
                )),
        );

    app.with_state(state)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(categories::list_categories))
        .route("/categories/{id}", get(categories::get_category))
        .route("/services", get(services::list_services))
        .route("/services/{id}", get(services::get_service))
        .route("/subcategories", get(subcategories::list_subcategories))
        .route("/subcategories/{id}", get(subcategories::get_subcategory))
        .route("/user/login", post(users::login))
        .route("/contact", post(contact::send_contact_form))
        .route("/healthcheck", get(health::health_check))
}

fn protected_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", post(categories::create_category))
        .route(
            "/categories/{id}",
            axum::routing::patch(categories::update_category).delete(categories::delete_category),
        )
        .route("/services", post(services::create_service))
        .route(
            "/services/{id}",
            axum::routing::patch(services::update_service).delete(services::delete_service),
        )
        .route("/subcategories", post(subcategories::create_subcategory))
        .route(
            "/subcategories/{id}",
            axum::routing::put(subcategories::update_subcategory)
                .delete(subcategories::delete_subcategory),
        )
        .route("/user/register", post(users::register_user))
        .route("/user/logout", post(users::logout))
        .route_layer(axum::middleware::from_fn_with_state(
            state.sessions.clone(),
            require_session,
        ))
}

/// Setup CORS configuration
fn setup_cors(origins: &[String]) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
        Method::OPTIONS,
    ];

    if origins.iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - session cookies will not be sent");
        return CorsLayer::new()
            .allow_origin(AnyOrigin)
            .allow_methods(methods)
            .allow_headers(AnyOrigin);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
}

async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            "the requested resource could not be found",
            "NOT_FOUND",
        )),
    )
        .into_response()
}

async fn method_not_allowed(method: Method, OriginalUri(uri): OriginalUri) -> Response {
    tracing::debug!(%method, path = %uri.path(), "Method not allowed");
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorResponse::new(
            format!("Method {} is not allowed for this resource", method),
            "METHOD_NOT_ALLOWED",
        )),
    )
        .into_response()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");

    let mut response = (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(
            "the server encountered a problem and could not process your request",
            "INTERNAL_ERROR",
        )),
    )
        .into_response();
    response
        .headers_mut()
        .insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}
