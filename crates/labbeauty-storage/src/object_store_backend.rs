//! Cloud object storage through the `object_store` crate.
//!
//! One implementation serves Azure Blob Storage, S3-compatible stores, and the
//! in-memory store; only construction differs.

use crate::traits::{compose_url, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::azure::{MicrosoftAzure, MicrosoftAzureBuilder};
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload, Result as ObjectResult};

/// Storage backed by any `object_store` implementation.
#[derive(Clone)]
pub struct ObjectStoreStorage<S> {
    store: S,
    backend: StorageBackend,
    container: String,
    base_url: String,
}

impl ObjectStoreStorage<MicrosoftAzure> {
    /// Azure Blob Storage. Credentials not given here are read from the
    /// `AZURE_*` environment variables by the builder.
    pub fn azure(
        account: &str,
        access_key: Option<&str>,
        container: String,
        base_url: String,
    ) -> StorageResult<Self> {
        let mut builder = MicrosoftAzureBuilder::from_env()
            .with_account(account)
            .with_container_name(container.clone());
        if let Some(key) = access_key {
            builder = builder.with_access_key(key);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self {
            store,
            backend: StorageBackend::Azure,
            container,
            base_url,
        })
    }
}

impl ObjectStoreStorage<AmazonS3> {
    /// S3 or an S3-compatible provider when `endpoint_url` is set.
    pub fn s3(
        bucket: String,
        region: &str,
        endpoint_url: Option<&str>,
        base_url: String,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region)
            .with_bucket_name(bucket.clone());

        if let Some(endpoint) = endpoint_url {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(Self {
            store,
            backend: StorageBackend::S3,
            container: bucket,
            base_url,
        })
    }
}

impl ObjectStoreStorage<InMemory> {
    /// Process-local store for development; contents are lost on restart.
    pub fn in_memory(container: String, base_url: String) -> Self {
        Self {
            store: InMemory::new(),
            backend: StorageBackend::Memory,
            container,
            base_url,
        }
    }
}

#[async_trait]
impl<S> Storage for ObjectStoreStorage<S>
where
    S: ObjectStore,
{
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        let size = data.len();
        let location = Path::from(key);
        let start = std::time::Instant::now();

        let result: ObjectResult<_> =
            ObjectStoreExt::put(&self.store, &location, PutPayload::from(data)).await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                container = %self.container,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Object upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            backend = %self.backend,
            container = %self.container,
            key = %key,
            content_type = %content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object upload successful"
        );

        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let location = Path::from(key);
        let start = std::time::Instant::now();

        let result: ObjectResult<_> = ObjectStoreExt::delete(&self.store, &location).await;

        result.map_err(|e| match e {
            ObjectStoreError::NotFound { .. } => StorageError::NotFound(key.to_string()),
            other => {
                tracing::error!(
                    error = %other,
                    container = %self.container,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Object delete failed"
                );
                StorageError::DeleteFailed(other.to_string())
            }
        })?;

        tracing::info!(
            backend = %self.backend,
            container = %self.container,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object delete successful"
        );

        Ok(())
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let location = Path::from(key);
        match ObjectStoreExt::head(&self.store, &location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    fn public_url(&self, key: &str) -> String {
        compose_url(&self.base_url, Some(&self.container), key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> ObjectStoreStorage<InMemory> {
        ObjectStoreStorage::in_memory(
            "photos".to_string(),
            "https://labbeauty.blob.core.windows.net".to_string(),
        )
    }

    #[tokio::test]
    async fn upload_then_exists_then_delete() {
        let storage = memory();

        storage
            .upload("a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();
        assert!(storage.exists("a.png").await.unwrap());

        storage.delete("a.png").await.unwrap();
        assert!(!storage.exists("a.png").await.unwrap());
    }

    #[tokio::test]
    async fn upload_overwrites_by_name() {
        let storage = memory();
        storage
            .upload("a.png", Bytes::from_static(b"one"), "image/png")
            .await
            .unwrap();
        storage
            .upload("a.png", Bytes::from_static(b"two"), "image/png")
            .await
            .unwrap();
        assert!(storage.exists("a.png").await.unwrap());
    }

    #[test]
    fn public_url_includes_container() {
        assert_eq!(
            memory().public_url("a.png"),
            "https://labbeauty.blob.core.windows.net/photos/a.png"
        );
    }
}
