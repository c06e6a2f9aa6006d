//! In-memory repositories for tests that run without PostgreSQL.
//!
//! They honour the same contracts as the SQL repositories: unique columns report
//! [`AppError::Conflict`], ids below one are never found, and deletes return the
//! photo the row referenced.

use async_trait::async_trait;
use chrono::Utc;
use labbeauty_core::{AppError, MediaRef, PhotoRecord, SubCategory, User};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use crate::db::query::not_found;
use crate::{PhotoRecordStore, SubCategoryStore, UserStore};

/// Photo-owning rows keyed by id, unique on [`PhotoRecord::unique_value`].
pub struct InMemoryPhotoStore<R> {
    rows: Arc<Mutex<BTreeMap<i64, R>>>,
    next_id: Arc<AtomicI64>,
    fail_writes: Arc<AtomicBool>,
}

impl<R> Clone for InMemoryPhotoStore<R> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            next_id: self.next_id.clone(),
            fail_writes: self.fail_writes.clone(),
        }
    }
}

impl<R: PhotoRecord> Default for InMemoryPhotoStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: PhotoRecord> InMemoryPhotoStore<R> {
    pub fn new() -> Self {
        Self {
            rows: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make inserts and updates fail as if the database were unreachable.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self) -> Vec<R> {
        self.rows.lock().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_writable(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Timeout("injected write failure".to_string()));
        }
        Ok(())
    }

    fn check_unique(rows: &BTreeMap<i64, R>, record: &R) -> Result<(), AppError> {
        let taken = rows
            .values()
            .any(|r| r.id() != record.id() && r.unique_value() == record.unique_value());
        if taken {
            return Err(AppError::Conflict {
                value: record.unique_value().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl<R: PhotoRecord> PhotoRecordStore<R> for InMemoryPhotoStore<R> {
    async fn insert(&self, record: &R) -> Result<R, AppError> {
        self.check_writable()?;

        let mut rows = self.rows.lock().unwrap();
        let mut record = record.clone();
        record.set_id(0);
        Self::check_unique(&rows, &record)?;

        record.set_id(self.next_id.fetch_add(1, Ordering::SeqCst));
        rows.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<R, AppError> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn list(&self) -> Result<Vec<R>, AppError> {
        Ok(self.rows())
    }

    async fn update(&self, record: &R) -> Result<R, AppError> {
        self.check_writable()?;

        let mut rows = self.rows.lock().unwrap();
        if !rows.contains_key(&record.id()) {
            return Err(not_found());
        }
        Self::check_unique(&rows, record)?;

        rows.insert(record.id(), record.clone());
        Ok(record.clone())
    }

    async fn delete_returning_media(&self, id: i64) -> Result<MediaRef, AppError> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|r| r.media())
            .ok_or_else(not_found)
    }
}

#[derive(Clone, Default)]
pub struct InMemorySubCategoryStore {
    rows: Arc<Mutex<BTreeMap<i64, SubCategory>>>,
    next_id: Arc<AtomicI64>,
}

#[async_trait]
impl SubCategoryStore for InMemorySubCategoryStore {
    async fn insert(&self, name: &str) -> Result<SubCategory, AppError> {
        let subcategory = SubCategory {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            name: name.to_string(),
        };
        self.rows
            .lock()
            .unwrap()
            .insert(subcategory.id, subcategory.clone());
        Ok(subcategory)
    }

    async fn get(&self, id: i64) -> Result<SubCategory, AppError> {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn list(&self) -> Result<Vec<SubCategory>, AppError> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, subcategory: &SubCategory) -> Result<SubCategory, AppError> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&subcategory.id) {
            Some(row) => {
                row.name = subcategory.name.clone();
                Ok(row.clone())
            }
            None => Err(not_found()),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.rows
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(not_found)
    }
}

#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<Vec<User>>>,
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        activated: bool,
    ) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(AppError::Conflict {
                value: email.to_string(),
            });
        }

        let user = User {
            id: users.len() as i64 + 1,
            created_at: Utc::now(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            activated,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}
