//! Bounded retry for storage operations.
//!
//! Every backend is wrapped in [`RetryingStorage`]: transient failures are retried
//! with a fixed pause between attempts, and once the budget is spent the caller gets
//! a terminal [`StorageError::RetriesExhausted`].

use async_trait::async_trait;
use bytes::Bytes;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::traits::StorageOperation;
use crate::{Storage, StorageBackend, StorageError, StorageResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    /// Fixed pause between attempts.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or the budget runs out.
    pub async fn run<F, Fut>(
        &self,
        operation: StorageOperation,
        key: &str,
        mut op: F,
    ) -> StorageResult<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StorageResult<()>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(()) => {
                    if attempt > 1 {
                        tracing::info!(%operation, key, attempt, "Storage operation succeeded after retry");
                    }
                    return Ok(());
                }
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= self.attempts => {
                    tracing::error!(
                        %operation,
                        key,
                        attempts = attempt,
                        error = %e,
                        "Storage operation failed, giving up"
                    );
                    return Err(StorageError::RetriesExhausted {
                        operation,
                        attempts: attempt,
                        last: Box::new(e),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        %operation,
                        key,
                        attempt,
                        max_attempts = self.attempts,
                        error = %e,
                        "Storage operation failed, retrying"
                    );
                    attempt += 1;
                    tokio::time::sleep(self.backoff).await;
                }
            }
        }
    }
}

/// Storage decorator applying a [`RetryPolicy`] to uploads and deletes.
#[derive(Clone)]
pub struct RetryingStorage {
    inner: Arc<dyn Storage>,
    policy: RetryPolicy,
}

impl RetryingStorage {
    pub fn new(inner: Arc<dyn Storage>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl Storage for RetryingStorage {
    async fn upload(&self, key: &str, data: Bytes, content_type: &str) -> StorageResult<()> {
        self.policy
            .run(StorageOperation::Upload, key, || {
                self.inner.upload(key, data.clone(), content_type)
            })
            .await
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.policy
            .run(StorageOperation::Delete, key, || self.inner.delete(key))
            .await
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        self.inner.exists(key).await
    }

    fn public_url(&self, key: &str) -> String {
        self.inner.public_url(key)
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockStorage, StorageCall};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn always_failing_upload_makes_exactly_three_attempts() {
        let mock = MockStorage::new();
        mock.always_fail_uploads();
        let storage = RetryingStorage::new(Arc::new(mock.clone()), fast_policy());

        let err = storage
            .upload("a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap_err();

        assert_eq!(mock.uploads().len(), 3);
        match err {
            StorageError::RetriesExhausted {
                operation,
                attempts,
                ..
            } => {
                assert_eq!(operation, StorageOperation::Upload);
                assert_eq!(attempts, 3);
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn transient_failures_are_absorbed() {
        let mock = MockStorage::new();
        mock.fail_uploads(2);
        let storage = RetryingStorage::new(Arc::new(mock.clone()), fast_policy());

        storage
            .upload("a.png", Bytes::from_static(b"png"), "image/png")
            .await
            .unwrap();

        assert_eq!(mock.uploads().len(), 3);
        assert!(mock.contains("a.png"));
    }

    #[tokio::test]
    async fn missing_object_is_not_retried() {
        let mock = MockStorage::new();
        let storage = RetryingStorage::new(Arc::new(mock.clone()), fast_policy());

        let err = storage.delete("missing.png").await.unwrap_err();

        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(mock.calls(), vec![StorageCall::Delete("missing.png".to_string())]);
    }

    #[tokio::test]
    async fn backoff_is_applied_between_attempts() {
        let mock = MockStorage::new();
        mock.always_fail_deletes();
        let storage = RetryingStorage::new(
            Arc::new(mock.clone()),
            RetryPolicy::new(3, Duration::from_millis(20)),
        );

        let started = std::time::Instant::now();
        let _ = storage.delete("a.png").await;

        assert!(started.elapsed() >= Duration::from_millis(40));
        assert_eq!(mock.deletes().len(), 3);
    }
}
