use async_trait::async_trait;
use labbeauty_core::{AppError, MediaRef, PhotoRecord, SubCategory, User};

/// Persistence for entities that own a stored photo.
#[async_trait]
pub trait PhotoRecordStore<R: PhotoRecord>: Send + Sync {
    /// Insert `record` and return it with its assigned id.
    async fn insert(&self, record: &R) -> Result<R, AppError>;

    async fn get(&self, id: i64) -> Result<R, AppError>;

    async fn list(&self) -> Result<Vec<R>, AppError>;

    /// Overwrite every column of the row with `record.id()`.
    async fn update(&self, record: &R) -> Result<R, AppError>;

    /// Delete the row and return the photo it referenced.
    async fn delete_returning_media(&self, id: i64) -> Result<MediaRef, AppError>;
}

#[async_trait]
pub trait SubCategoryStore: Send + Sync {
    async fn insert(&self, name: &str) -> Result<SubCategory, AppError>;
    async fn get(&self, id: i64) -> Result<SubCategory, AppError>;
    async fn list(&self) -> Result<Vec<SubCategory>, AppError>;
    async fn update(&self, subcategory: &SubCategory) -> Result<SubCategory, AppError>;
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. A taken email is reported as [`AppError::Conflict`].
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        activated: bool,
    ) -> Result<User, AppError>;

    /// Look up an account by email, case-insensitively.
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
}
