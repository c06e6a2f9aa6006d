use async_trait::async_trait;
use labbeauty_core::constants::DEFAULT_QUERY_TIMEOUT;
use labbeauty_core::{AppError, User};
use sqlx::{PgPool, Postgres};
use std::time::Duration;

use super::query::with_deadline;
use super::traits::UserStore;

/// Repository for back-office accounts
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
    query_timeout: Duration,
}

impl UserRepository {
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
impl UserStore for UserRepository {
    #[tracing::instrument(skip(self, password_hash), fields(db.table = "users", db.operation = "insert"))]
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        activated: bool,
    ) -> Result<User, AppError> {
        with_deadline(
            self.query_timeout,
            "users.insert",
            sqlx::query_as::<Postgres, User>(
                r#"
                INSERT INTO users (name, email, password_hash, activated)
                VALUES ($1, $2, $3, $4)
                RETURNING id, created_at, name, email, password_hash, activated
                "#,
            )
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(activated)
            .fetch_one(&self.pool),
        )
        .await
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select"))]
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        with_deadline(
            self.query_timeout,
            "users.select",
            sqlx::query_as::<Postgres, User>(
                r#"
                SELECT id, created_at, name, email, password_hash, activated
                FROM users
                WHERE lower(email) = lower($1)
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await
    }
}
