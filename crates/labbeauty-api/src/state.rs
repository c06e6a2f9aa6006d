//! Shared application state

use labbeauty_core::{Category, Service};
use labbeauty_db::{PhotoRecordStore, SubCategoryStore, UserStore};
use labbeauty_worker::BackgroundTasks;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::SessionKeys;
use crate::services::{MediaCoordinator, Notifier};

/// Main application state
///
/// Repositories are held behind their traits so the router can run against
/// in-memory stores.
#[derive(Clone)]
pub struct AppState {
    pub categories: Arc<dyn PhotoRecordStore<Category>>,
    pub services: Arc<dyn PhotoRecordStore<Service>>,
    pub subcategories: Arc<dyn SubCategoryStore>,
    pub users: Arc<dyn UserStore>,
    pub media: MediaCoordinator,
    /// Contact form relay; the same bot operators get alerts from.
    pub notifier: Arc<dyn Notifier>,
    pub sessions: Arc<SessionKeys>,
    pub tasks: BackgroundTasks,
    /// Present when backed by PostgreSQL; used by the health check.
    pub pool: Option<PgPool>,
    pub environment: String,
}
