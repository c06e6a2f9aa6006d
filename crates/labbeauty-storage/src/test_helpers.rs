//! In-memory storage double for tests.
//!
//! Records every call, keeps uploaded objects in a map, and can be told to fail or
//! stall uploads and deletes.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::traits::compose_url;
use crate::{Storage, StorageBackend, StorageError, StorageResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCall {
    Upload(String),
    Delete(String),
}

const ALWAYS: u32 = u32::MAX;

#[derive(Debug, Default)]
struct FailurePlan {
    upload_failures: u32,
    delete_failures: u32,
    upload_delay: Option<Duration>,
}

#[derive(Clone)]
pub struct MockStorage {
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
    calls: Arc<Mutex<Vec<StorageCall>>>,
    plan: Arc<Mutex<FailurePlan>>,
    base_url: String,
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            objects: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            plan: Arc::new(Mutex::new(FailurePlan::default())),
            base_url: "https://blob.test/photos".to_string(),
        }
    }

    /// Fail the next `n` upload calls.
    pub fn fail_uploads(&self, n: u32) {
        self.plan.lock().unwrap().upload_failures = n;
    }

    pub fn always_fail_uploads(&self) {
        self.fail_uploads(ALWAYS);
    }

    /// Fail the next `n` delete calls.
    pub fn fail_deletes(&self, n: u32) {
        self.plan.lock().unwrap().delete_failures = n;
    }

    pub fn always_fail_deletes(&self) {
        self.fail_deletes(ALWAYS);
    }

    /// Make each upload take at least `delay`.
    pub fn delay_uploads(&self, delay: Duration) {
        self.plan.lock().unwrap().upload_delay = Some(delay);
    }

    /// Put an object directly, without recording a call.
    pub fn insert(&self, key: &str, data: &'static [u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), Bytes::from_static(data));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<StorageCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StorageCall::Upload(key) => Some(key),
                StorageCall::Delete(_) => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                StorageCall::Delete(key) => Some(key),
                StorageCall::Upload(_) => None,
            })
            .collect()
    }

    fn take_failure(counter: &mut u32) -> bool {
        match *counter {
            0 => false,
            ALWAYS => true,
            _ => {
                *counter -= 1;
                true
            }
        }
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn upload(&self, key: &str, data: Bytes, _content_type: &str) -> StorageResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::Upload(key.to_string()));

        let (fail, delay) = {
            let mut plan = self.plan.lock().unwrap();
            (Self::take_failure(&mut plan.upload_failures), plan.upload_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            return Err(StorageError::UploadFailed(format!(
                "injected upload failure for {}",
                key
            )));
        }

        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(StorageCall::Delete(key.to_string()));

        let fail = Self::take_failure(&mut self.plan.lock().unwrap().delete_failures);
        if fail {
            return Err(StorageError::DeleteFailed(format!(
                "injected delete failure for {}",
                key
            )));
        }

        match self.objects.lock().unwrap().remove(key) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.contains(key))
    }

    fn public_url(&self, key: &str) -> String {
        compose_url(&self.base_url, None, key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
