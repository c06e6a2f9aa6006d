//! Storage setup

use anyhow::{Context, Result};
use labbeauty_core::Config;
use labbeauty_storage::{create_storage, Storage, StorageSettings};
use std::sync::Arc;

/// Build the configured storage backend, wrapped in the retry policy.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let settings = StorageSettings::from_config(config);
    tracing::info!(
        backend = %settings.backend,
        retry_attempts = settings.retry.attempts,
        retry_backoff_ms = settings.retry.backoff.as_millis() as u64,
        "Initializing storage"
    );

    create_storage(&settings)
        .await
        .context("Failed to initialize storage backend")
}
