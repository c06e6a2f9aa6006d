//! LabBeauty API Library
//!
//! HTTP handlers, middleware, the photo upload coordinator, and application setup.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod setup;
pub mod state;
pub mod telemetry;
mod utils;

pub use error::{ErrorResponse, HttpAppError};
pub use services::{MediaCoordinator, NotificationSink, Notifier, PhotoUpload};
pub use setup::routes::{setup_routes, HttpSettings};
pub use state::AppState;
