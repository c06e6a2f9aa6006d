use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Back-office operator account.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub activated: bool,
}
