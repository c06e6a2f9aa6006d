#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-object-store")]
use crate::ObjectStoreStorage;
use crate::{RetryPolicy, RetryingStorage, Storage, StorageBackend, StorageError, StorageResult};
use labbeauty_core::Config;
use std::sync::Arc;
use std::time::Duration;

/// Everything needed to build a storage backend, detached from the full config.
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub blob_url: Option<String>,
    pub container_name: Option<String>,
    pub azure_account: Option<String>,
    pub azure_access_key: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>,
    pub local_path: Option<String>,
    pub retry: RetryPolicy,
}

impl StorageSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            backend: config.storage_backend(),
            blob_url: config.blob_url().map(String::from),
            container_name: config.container_name().map(String::from),
            azure_account: config.azure_storage_account().map(String::from),
            azure_access_key: config.azure_storage_access_key().map(String::from),
            s3_region: config.s3_region().map(String::from),
            s3_endpoint: config.s3_endpoint().map(String::from),
            local_path: config.local_storage_path().map(String::from),
            retry: RetryPolicy::new(
                config.storage_retry_attempts(),
                config.storage_retry_backoff(),
            ),
        }
    }

    /// In-memory backend with a fast retry policy.
    pub fn memory() -> Self {
        Self {
            backend: StorageBackend::Memory,
            blob_url: None,
            container_name: Some("photos".to_string()),
            azure_account: None,
            azure_access_key: None,
            s3_region: None,
            s3_endpoint: None,
            local_path: None,
            retry: RetryPolicy::new(3, Duration::from_millis(10)),
        }
    }

    fn require<'a>(value: &'a Option<String>, name: &str) -> StorageResult<&'a str> {
        value
            .as_deref()
            .ok_or_else(|| StorageError::ConfigError(format!("{} not configured", name)))
    }
}

/// Create a storage backend based on configuration, wrapped in the retry policy.
pub async fn create_storage(settings: &StorageSettings) -> StorageResult<Arc<dyn Storage>> {
    let inner = create_backend(settings).await?;

    tracing::info!(
        backend = %settings.backend,
        attempts = settings.retry.attempts,
        backoff_ms = settings.retry.backoff.as_millis() as u64,
        "Storage backend ready"
    );

    Ok(Arc::new(RetryingStorage::new(inner, settings.retry)))
}

async fn create_backend(settings: &StorageSettings) -> StorageResult<Arc<dyn Storage>> {
    match settings.backend {
        #[cfg(feature = "storage-object-store")]
        StorageBackend::Azure => {
            let account = StorageSettings::require(&settings.azure_account, "AZURE_STORAGE_ACCOUNT")?;
            let container = StorageSettings::require(&settings.container_name, "CONTAINER_NAME")?;
            let blob_url = StorageSettings::require(&settings.blob_url, "BLOB_URL")?;

            let storage = ObjectStoreStorage::azure(
                account,
                settings.azure_access_key.as_deref(),
                container.to_string(),
                blob_url.to_string(),
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(feature = "storage-object-store")]
        StorageBackend::S3 => {
            let bucket = StorageSettings::require(&settings.container_name, "CONTAINER_NAME")?;
            let region = StorageSettings::require(&settings.s3_region, "S3_REGION or AWS_REGION")?;
            let blob_url = StorageSettings::require(&settings.blob_url, "BLOB_URL")?;

            let storage = ObjectStoreStorage::s3(
                bucket.to_string(),
                region,
                settings.s3_endpoint.as_deref(),
                blob_url.to_string(),
            )?;
            Ok(Arc::new(storage))
        }

        #[cfg(feature = "storage-object-store")]
        StorageBackend::Memory => {
            let container = settings
                .container_name
                .clone()
                .unwrap_or_else(|| "photos".to_string());
            let base_url = settings
                .blob_url
                .clone()
                .unwrap_or_else(|| "memory://local".to_string());
            Ok(Arc::new(ObjectStoreStorage::in_memory(container, base_url)))
        }

        #[cfg(not(feature = "storage-object-store"))]
        StorageBackend::Azure | StorageBackend::S3 | StorageBackend::Memory => {
            Err(StorageError::ConfigError(format!(
                "{} storage backend not available (storage-object-store feature not enabled)",
                settings.backend
            )))
        }

        #[cfg(feature = "storage-local")]
        StorageBackend::Local => {
            let base_path = StorageSettings::require(&settings.local_path, "LOCAL_STORAGE_PATH")?;
            let base_url = StorageSettings::require(&settings.blob_url, "BLOB_URL")?;

            let storage = LocalStorage::new(base_path, base_url.to_string()).await?;
            Ok(Arc::new(storage))
        }

        #[cfg(not(feature = "storage-local"))]
        StorageBackend::Local => Err(StorageError::ConfigError(
            "Local storage backend not available (storage-local feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "storage-object-store"))]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn memory_backend_is_wrapped_and_usable() {
        let storage = create_storage(&StorageSettings::memory()).await.unwrap();

        assert_eq!(storage.backend_type(), StorageBackend::Memory);
        storage
            .upload("a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert!(storage.exists("a.png").await.unwrap());
        assert_eq!(storage.public_url("a.png"), "memory://local/photos/a.png");
    }

    #[tokio::test]
    async fn missing_settings_are_config_errors() {
        let settings = StorageSettings {
            backend: StorageBackend::Azure,
            ..StorageSettings::memory()
        };

        match create_storage(&settings).await {
            Err(StorageError::ConfigError(message)) => {
                assert!(message.contains("AZURE_STORAGE_ACCOUNT"))
            }
            Err(other) => panic!("expected ConfigError, got {:?}", other),
            Ok(_) => panic!("expected ConfigError"),
        }
    }
}
