use async_trait::async_trait;
use labbeauty_core::constants::DEFAULT_QUERY_TIMEOUT;
use labbeauty_core::{AppError, MediaRef, Service};
use sqlx::{PgPool, Postgres};
use std::time::Duration;

use super::query::{not_found, with_deadline};
use super::traits::PhotoRecordStore;

/// Repository for the `services` table
#[derive(Clone)]
pub struct ServiceRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl ServiceRepository {
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
impl PhotoRecordStore<Service> for ServiceRepository {
    #[tracing::instrument(skip(self, service), fields(db.table = "services", db.operation = "insert"))]
    async fn insert(&self, service: &Service) -> Result<Service, AppError> {
        with_deadline(
            self.query_timeout,
            "services.insert",
            sqlx::query_as::<Postgres, Service>(
                r#"
                INSERT INTO services (title, description, url, photo_url, photo_key)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, title, description, url, photo_url, photo_key
                "#,
            )
            .bind(&service.title)
            .bind(&service.description)
            .bind(&service.url)
            .bind(&service.photo_url)
            .bind(&service.photo_key)
            .fetch_one(&self.pool),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "services", db.operation = "select", db.record_id = id))]
    async fn get(&self, id: i64) -> Result<Service, AppError> {
        if id < 1 {
            return Err(not_found());
        }

        with_deadline(
            self.query_timeout,
            "services.select",
            sqlx::query_as::<Postgres, Service>(
                "SELECT id, title, description, url, photo_url, photo_key FROM services WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(not_found)
    }

    #[tracing::instrument(skip(self), fields(db.table = "services", db.operation = "select"))]
    async fn list(&self) -> Result<Vec<Service>, AppError> {
        with_deadline(
            self.query_timeout,
            "services.list",
            sqlx::query_as::<Postgres, Service>(
                "SELECT id, title, description, url, photo_url, photo_key FROM services ORDER BY id",
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    #[tracing::instrument(skip(self, service), fields(db.table = "services", db.operation = "update", db.record_id = service.id))]
    async fn update(&self, service: &Service) -> Result<Service, AppError> {
        with_deadline(
            self.query_timeout,
            "services.update",
            sqlx::query_as::<Postgres, Service>(
                r#"
                UPDATE services
                SET title = $1, description = $2, url = $3, photo_url = $4, photo_key = $5
                WHERE id = $6
                RETURNING id, title, description, url, photo_url, photo_key
                "#,
            )
            .bind(&service.title)
            .bind(&service.description)
            .bind(&service.url)
            .bind(&service.photo_url)
            .bind(&service.photo_key)
            .bind(service.id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(not_found)
    }

    #[tracing::instrument(skip(self), fields(db.table = "services", db.operation = "delete", db.record_id = id))]
    async fn delete_returning_media(&self, id: i64) -> Result<MediaRef, AppError> {
        if id < 1 {
            return Err(not_found());
        }

        let row: Option<(String, String)> = with_deadline(
            self.query_timeout,
            "services.delete",
            sqlx::query_as::<Postgres, (String, String)>(
                "DELETE FROM services WHERE id = $1 RETURNING photo_key, photo_url",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.map(|(key, url)| MediaRef { key, url })
            .ok_or_else(not_found)
    }
}
