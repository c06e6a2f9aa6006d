use async_trait::async_trait;
use labbeauty_core::constants::DEFAULT_QUERY_TIMEOUT;
use labbeauty_core::{AppError, SubCategory};
use sqlx::{PgPool, Postgres};
use std::time::Duration;

use super::query::{not_found, with_deadline};
use super::traits::SubCategoryStore;

/// Repository for the `subcategories` table
#[derive(Clone)]
pub struct SubCategoryRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl SubCategoryRepository {
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
impl SubCategoryStore for SubCategoryRepository {
    #[tracing::instrument(skip(self), fields(db.table = "subcategories", db.operation = "insert"))]
    async fn insert(&self, name: &str) -> Result<SubCategory, AppError> {
        with_deadline(
            self.query_timeout,
            "subcategories.insert",
            sqlx::query_as::<Postgres, SubCategory>(
                "INSERT INTO subcategories (name) VALUES ($1) RETURNING id, name",
            )
            .bind(name)
            .fetch_one(&self.pool),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "subcategories", db.operation = "select", db.record_id = id))]
    async fn get(&self, id: i64) -> Result<SubCategory, AppError> {
        if id < 1 {
            return Err(not_found());
        }

        with_deadline(
            self.query_timeout,
            "subcategories.select",
            sqlx::query_as::<Postgres, SubCategory>(
                "SELECT id, name FROM subcategories WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(not_found)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subcategories", db.operation = "select"))]
    async fn list(&self) -> Result<Vec<SubCategory>, AppError> {
        with_deadline(
            self.query_timeout,
            "subcategories.list",
            sqlx::query_as::<Postgres, SubCategory>("SELECT id, name FROM subcategories ORDER BY id")
                .fetch_all(&self.pool),
        )
        .await
    }

    #[tracing::instrument(skip(self, subcategory), fields(db.table = "subcategories", db.operation = "update", db.record_id = subcategory.id))]
    async fn update(&self, subcategory: &SubCategory) -> Result<SubCategory, AppError> {
        with_deadline(
            self.query_timeout,
            "subcategories.update",
            sqlx::query_as::<Postgres, SubCategory>(
                "UPDATE subcategories SET name = $1 WHERE id = $2 RETURNING id, name",
            )
            .bind(&subcategory.name)
            .bind(subcategory.id)
            .fetch_optional(&self.pool),
        )
        .await?
        .ok_or_else(not_found)
    }

    #[tracing::instrument(skip(self), fields(db.table = "subcategories", db.operation = "delete", db.record_id = id))]
    async fn delete(&self, id: i64) -> Result<(), AppError> {
        if id < 1 {
            return Err(not_found());
        }

        let result = with_deadline(
            self.query_timeout,
            "subcategories.delete",
            sqlx::query("DELETE FROM subcategories WHERE id = $1")
                .bind(id)
                .execute(&self.pool),
        )
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found());
        }
        Ok(())
    }
}
