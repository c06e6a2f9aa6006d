//! Dual writes of catalog photos to object storage and rows to PostgreSQL.
//!
//! Every write that carries a photo follows one policy:
//!
//! 1. The object name is generated from the upload's extension (pure, may reject).
//! 2. The upload is submitted to the background runner right away.
//! 3. Fields are validated while the upload is in flight. A validation failure
//!    returns immediately; the delete that undoes the upload is chained on the
//!    upload's handle so it can never run first.
//! 4. The row is written only after the upload has been confirmed. If the upload
//!    or the row write fails, the new object is deleted before the error is
//!    returned.
//! 5. An update deletes the photo it replaces after step 4 confirms the upload
//!    and before the row is written.
//!
//! Cleanup that cannot complete is reported to the [`NotificationSink`] and never
//! replaces the error the client sees.

use bytes::Bytes;
use labbeauty_core::{AppError, MediaRef, PhotoRecord, Validator};
use labbeauty_db::PhotoRecordStore;
use labbeauty_storage::{generate_object_name, Storage, StorageError, StorageResult};
use labbeauty_worker::{BackgroundTasks, TaskHandle};
use std::sync::Arc;

use super::notifier::NotificationSink;
use crate::error::storage_to_app_error;

/// A photo received with a create or update request.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

type StorageHandle = TaskHandle<StorageResult<()>>;

#[derive(Clone)]
pub struct MediaCoordinator {
    storage: Arc<dyn Storage>,
    tasks: BackgroundTasks,
    sink: NotificationSink,
}

impl MediaCoordinator {
    pub fn new(storage: Arc<dyn Storage>, tasks: BackgroundTasks, sink: NotificationSink) -> Self {
        Self {
            storage,
            tasks,
            sink,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn tasks(&self) -> &BackgroundTasks {
        &self.tasks
    }

    /// Create `record` with `photo` attached.
    #[tracing::instrument(skip_all, fields(resource = R::RESOURCE))]
    pub async fn create<R: PhotoRecord>(
        &self,
        repo: &dyn PhotoRecordStore<R>,
        mut record: R,
        photo: Option<PhotoUpload>,
    ) -> Result<R, AppError> {
        let Some(photo) = photo else {
            let mut v = Validator::new();
            record.validate(&mut v);
            v.add_error("photo_url", "photo must be provided");
            return Err(AppError::FailedValidation(v.errors().clone()));
        };

        let key = generate_object_name(&photo.filename).map_err(storage_to_app_error)?;
        let upload = self.submit_upload(key.clone(), photo);
        record.set_media(self.media_for(&key));

        if let Err(err) = Self::validate(&record) {
            tracing::debug!(key = %key, "Validation failed, discarding uploaded photo");
            self.discard_after(&upload, key);
            return Err(err);
        }

        if let Err(err) = Self::confirm_upload(&upload, &key).await {
            return Err(self
                .compensate_delete(err, key, "failed to delete photo after upload failure")
                .await);
        }

        match repo.insert(&record).await {
            Ok(saved) => {
                tracing::info!(id = saved.id(), key = %key, "Created with photo");
                Ok(saved)
            }
            Err(err) => {
                tracing::warn!(error = %err, key = %key, "Insert failed, deleting uploaded photo");
                Err(self
                    .compensate_delete(err, key, "failed to delete photo after insert failure")
                    .await)
            }
        }
    }

    /// Apply `patch` to the row `id`, replacing its photo when one is given.
    ///
    /// The old photo is deleted only once the patched fields are valid and the new
    /// photo is confirmed, so a rejected update or a failed upload leaves the row
    /// and its current photo untouched.
    #[tracing::instrument(skip_all, fields(resource = R::RESOURCE, id = id))]
    pub async fn update<R, F>(
        &self,
        repo: &dyn PhotoRecordStore<R>,
        id: i64,
        photo: Option<PhotoUpload>,
        patch: F,
    ) -> Result<R, AppError>
    where
        R: PhotoRecord,
        F: FnOnce(&mut R) + Send,
    {
        let mut record = repo.get(id).await?;

        let Some(photo) = photo else {
            patch(&mut record);
            Self::validate(&record)?;
            let saved = repo.update(&record).await?;
            tracing::info!(id = saved.id(), photo_replaced = false, "Updated");
            return Ok(saved);
        };

        let key = generate_object_name(&photo.filename).map_err(storage_to_app_error)?;
        let old = record.media();
        let upload = self.submit_upload(key.clone(), photo);
        record.set_media(self.media_for(&key));
        patch(&mut record);

        if let Err(err) = Self::validate(&record) {
            tracing::debug!(key = %key, "Validation failed, discarding replacement photo");
            self.discard_after(&upload, key);
            return Err(err);
        }

        if let Err(err) = Self::confirm_upload(&upload, &key).await {
            return Err(self
                .compensate_delete(err, key, "failed to delete photo after upload failure")
                .await);
        }

        let old_removed = self.remove_replaced(&old.key).await;

        match repo.update(&record).await {
            Ok(saved) => {
                tracing::info!(id = saved.id(), key = %key, photo_replaced = true, "Updated");
                Ok(saved)
            }
            Err(err) => {
                tracing::warn!(
                    error = %err,
                    key = %key,
                    old_key = %old.key,
                    "Update failed after photo replacement, deleting new photo"
                );
                if old_removed {
                    self.sink.report(
                        "row update failed after photo replacement, row still references deleted photo",
                        &old.key,
                        &err,
                    );
                }
                Err(self
                    .compensate_delete(err, key, "failed to delete photo after update failure")
                    .await)
            }
        }
    }

    /// Delete the row `id` and schedule deletion of its photo.
    #[tracing::instrument(skip_all, fields(resource = R::RESOURCE, id = id))]
    pub async fn delete<R: PhotoRecord>(
        &self,
        repo: &dyn PhotoRecordStore<R>,
        id: i64,
    ) -> Result<(), AppError> {
        let media = repo.delete_returning_media(id).await?;
        if media.key.is_empty() {
            return Ok(());
        }

        let storage = self.storage.clone();
        let sink = self.sink.clone();
        self.tasks.spawn("photo_delete", async move {
            match storage.delete(&media.key).await {
                Ok(()) | Err(StorageError::NotFound(_)) => {
                    tracing::debug!(key = %media.key, "Deleted photo of removed row");
                }
                Err(e) => sink.report("failed to delete photo of removed row", &media.key, &e),
            }
        });
        Ok(())
    }

    fn validate<R: PhotoRecord>(record: &R) -> Result<(), AppError> {
        let mut v = Validator::new();
        record.validate(&mut v);
        if v.valid() {
            return Ok(());
        }
        Err(AppError::FailedValidation(v.errors().clone()))
    }

    /// Delete the photo a row is about to stop referencing. Returns whether the
    /// object is gone; a failure is reported and does not stop the update.
    async fn remove_replaced(&self, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        match self.submit_delete(key.to_string()).wait().await {
            Some(Ok(())) | Some(Err(StorageError::NotFound(_))) => true,
            Some(Err(e)) => {
                self.sink.report("failed to delete replaced photo", key, &e);
                false
            }
            None => {
                self.sink
                    .report("failed to delete replaced photo", key, &"delete task panicked");
                false
            }
        }
    }

    fn media_for(&self, key: &str) -> MediaRef {
        MediaRef {
            key: key.to_string(),
            url: self.storage.public_url(key),
        }
    }

    fn submit_upload(&self, key: String, photo: PhotoUpload) -> StorageHandle {
        let storage = self.storage.clone();
        self.tasks.spawn("photo_upload", async move {
            storage
                .upload(&key, photo.data, &photo.content_type)
                .await
        })
    }

    fn submit_delete(&self, key: String) -> StorageHandle {
        let storage = self.storage.clone();
        self.tasks
            .spawn("photo_delete", async move { storage.delete(&key).await })
    }

    /// Delete `key` once `upload` has finished.
    fn discard_after(&self, upload: &StorageHandle, key: String) {
        let storage = self.storage.clone();
        let sink = self.sink.clone();
        self.tasks
            .spawn_after("photo_discard", upload, move |_| async move {
                // Runs even when the upload failed: a timed-out put may still land.
                match storage.delete(&key).await {
                    Ok(()) | Err(StorageError::NotFound(_)) => {
                        tracing::debug!(key = %key, "Discarded photo of rejected write");
                    }
                    Err(e) => sink.report("failed to delete unreferenced photo", &key, &e),
                }
            });
    }

    async fn confirm_upload(upload: &StorageHandle, key: &str) -> Result<(), AppError> {
        match upload.wait().await {
            Some(Ok(())) => Ok(()),
            Some(Err(e)) => {
                tracing::error!(error = %e, key = %key, "Photo upload failed");
                Err(storage_to_app_error(e))
            }
            None => Err(AppError::Storage(format!("upload of {} panicked", key))),
        }
    }

    /// Delete the new object after a failed write, folding a failed delete into `err`.
    async fn compensate_delete(&self, err: AppError, key: String, context: &str) -> AppError {
        match self.submit_delete(key.clone()).wait().await {
            Some(Ok(())) | Some(Err(StorageError::NotFound(_))) => err,
            Some(Err(e)) => {
                self.sink.report(context, &key, &e);
                err.with_compensation(format!("delete of {} failed: {}", key, e))
            }
            None => {
                self.sink.report(context, &key, &"delete task panicked");
                err.with_compensation(format!("delete of {} panicked", key))
            }
        }
    }
}
