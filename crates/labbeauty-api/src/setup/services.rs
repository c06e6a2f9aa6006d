//! Repositories and services behind [`AppState`]

use anyhow::Result;
use labbeauty_core::Config;
use labbeauty_db::{CategoryRepository, ServiceRepository, SubCategoryRepository, UserRepository};
use labbeauty_storage::Storage;
use labbeauty_worker::BackgroundTasks;
use sqlx::PgPool;
use std::sync::Arc;

use crate::auth::SessionKeys;
use crate::services::{notifier_from_config, MediaCoordinator, NotificationSink};
use crate::state::AppState;

pub fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    let query_timeout = config.db_query_timeout();
    let tasks = BackgroundTasks::new();
    let notifier = notifier_from_config(config)?;
    let sink = NotificationSink::new(notifier.clone(), tasks.clone());

    let state = AppState {
        categories: Arc::new(
            CategoryRepository::new(pool.clone()).with_query_timeout(query_timeout),
        ),
        services: Arc::new(ServiceRepository::new(pool.clone()).with_query_timeout(query_timeout)),
        subcategories: Arc::new(
            SubCategoryRepository::new(pool.clone()).with_query_timeout(query_timeout),
        ),
        users: Arc::new(UserRepository::new(pool.clone()).with_query_timeout(query_timeout)),
        media: MediaCoordinator::new(storage, tasks.clone(), sink),
        notifier,
        sessions: Arc::new(SessionKeys::new(
            config.session_secret(),
            config.session_max_age_secs(),
            config.is_production(),
        )),
        tasks,
        pool: Some(pool),
        environment: config.environment().to_string(),
    };

    tracing::info!("Services initialized");
    Ok(Arc::new(state))
}
