//! User persistence.
//!
//! The auth core talks to storage only through the `UserStore` trait;
//! `PgUserStore` is the Postgres implementation. Absence of a row is
//! `Ok(None)`, never an error — storage errors mean connectivity or query
//! failure and carry a stage tag for the logs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{AppError, DatabaseError};

/// A user row. Soft-deleted rows never leave the store.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub user_pass: String,
    pub created_at: DateTime<Utc>,
}

/// Listing projection for GET /users. The password hash stays inside the
/// store.
#[derive(Debug, Clone, serde::Serialize)]
pub struct UserSummary {
    pub user_id: i64,
    pub user_name: String,
    pub user_email: String,
    pub created_at: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, AppError>;

    /// Insert a new user and return its generated id.
    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, AppError>;

    /// List non-deleted users, optionally filtered to a single id.
    async fn list(&self, user_id: Option<i64>) -> Result<Vec<UserSummary>, AppError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_error(stage: &str, err: sqlx::Error) -> AppError {
    let message = err.to_string();

    if message.contains("duplicate key") || message.contains("unique constraint") {
        return AppError::Database(DatabaseError::UniqueConstraintViolation(
            "email already registered".to_string(),
        ));
    }
    if message.contains("pool") || message.contains("connect") {
        return AppError::Database(DatabaseError::ConnectionPool(format!(
            "{}: {}",
            stage, message
        )));
    }
    AppError::Database(DatabaseError::QueryExecution(format!(
        "{}: {}",
        stage, message
    )))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, AppError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT user_id, user_name, user_email, user_pass, created_at
            FROM users
            WHERE user_email = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("users.find_by_email", e))
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<UserRecord>, AppError> {
        sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT user_id, user_name, user_email, user_pass, created_at
            FROM users
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("users.find_by_id", e))
    }

    async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<i64, AppError> {
        let row = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO users (user_name, user_email, user_pass)
            VALUES ($1, $2, $3)
            RETURNING user_id
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| storage_error("users.insert", e))?;

        Ok(row.0)
    }

    async fn list(&self, user_id: Option<i64>) -> Result<Vec<UserSummary>, AppError> {
        let rows = match user_id {
            Some(id) => {
                sqlx::query_as::<_, (i64, String, String, DateTime<Utc>)>(
                    r#"
                    SELECT user_id, user_name, user_email, created_at
                    FROM users
                    WHERE deleted_at IS NULL AND user_id = $1
                    "#,
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, (i64, String, String, DateTime<Utc>)>(
                    r#"
                    SELECT user_id, user_name, user_email, created_at
                    FROM users
                    WHERE deleted_at IS NULL
                    "#,
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| storage_error("users.list", e))?;

        Ok(rows
            .into_iter()
            .map(|(user_id, user_name, user_email, created_at)| UserSummary {
                user_id,
                user_name,
                user_email,
                created_at: created_at.to_rfc3339(),
            })
            .collect())
    }
}
