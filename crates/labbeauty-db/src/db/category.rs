use async_trait::async_trait;
use labbeauty_core::constants::DEFAULT_QUERY_TIMEOUT;
use labbeauty_core::{AppError, Category, MediaRef};
use sqlx::{PgPool, Postgres};
use std::time::Duration;

use super::query::{not_found, with_deadline};
use super::traits::PhotoRecordStore;

/// Repository for the `categories` table
#[derive(Clone)]
pub struct CategoryRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl CategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    pub fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }
}

#[async_trait]
impl PhotoRecordStore<Category> for CategoryRepository {
    #[tracing::instrument(skip(self, category), fields(db.table = "categories", db.operation = "insert"))]
    async fn insert(&self, category: &Category) -> Result<Category, AppError> {
        with_deadline(
            self.query_timeout,
            "categories.insert",
            sqlx::query_as::<Postgres, Category>(
                r#"
                INSERT INTO categories (title, description, photo_url, photo_key)
                VALUES ($1, $2, $3, $4)
                RETURNING id, title, description, photo_url, photo_key
                "#,
            )
            .bind(&category.title)
            .bind(&category.description)
            .bind(&category.photo_url)
            .bind(&category.photo_key)
            .fetch_one(&self.pool),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "select", db.record_id = id))]
    async fn get(&self, id: i64) -> Result<Category, AppError> {
        if id < 1 {
            return Err(not_found());
        }

        with_deadline(
            self.query_timeout,
            "categories.select",
            sqlx::query_as::<Postgres, Category>(
                "SELECT id, title, description, photo_url, photo_key FROM categories WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(not_found)
    }

    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "select"))]
    async fn list(&self) -> Result<Vec<Category>, AppError> {
        with_deadline(
            self.query_timeout,
            "categories.list",
            sqlx::query_as::<Postgres, Category>(
                "SELECT id, title, description, photo_url, photo_key FROM categories ORDER BY id",
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    #[tracing::instrument(skip(self, category), fields(db.table = "categories", db.operation = "update", db.record_id = category.id))]
    async fn update(&self, category: &Category) -> Result<Category, AppError> {
        with_deadline(
            self.query_timeout,
            "categories.update",
            sqlx::query_as::<Postgres, Category>(
                r#"
                UPDATE categories
                SET title = $1, description = $2, photo_url = $3, photo_key = $4
                WHERE id = $5
                RETURNING id, title, description, photo_url, photo_key
                "#,
            )
            .bind(&category.title)
            .bind(&category.description)
            .bind(&category.photo_url)
            .bind(&category.photo_key)
            .bind(category.id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(not_found)
    }

    #[tracing::instrument(skip(self), fields(db.table = "categories", db.operation = "delete", db.record_id = id))]
    async fn delete_returning_media(&self, id: i64) -> Result<MediaRef, AppError> {
        if id < 1 {
            return Err(not_found());
        }

        let row: Option<(String, String)> = with_deadline(
            self.query_timeout,
            "categories.delete",
            sqlx::query_as::<Postgres, (String, String)>(
                "DELETE FROM categories WHERE id = $1 RETURNING photo_key, photo_url",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.map(|(key, url)| MediaRef { key, url })
            .ok_or_else(not_found)
    }
}
