//! PostgreSQL user store.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use eventhub_core::error::{AppError, ErrorKind};
use eventhub_core::result::AppResult;
use eventhub_core::traits::Repository;
use eventhub_core::types::{EventId, UserId};
use eventhub_entity::user::User;

use super::with_version;
use crate::store::{UserStore, stale_write};

/// Users stored as JSONB documents in the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Create a new user store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, id: UserId) -> AppResult<Option<i64>> {
        sqlx::query_scalar("SELECT version FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read user version", e)
            })
    }
}

#[async_trait]
impl Repository<User, UserId> for PgUserStore {
    async fn get_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, (Json<User>, i64)>(
            "SELECT document, version FROM users WHERE id = $1",
        )
        .bind(*id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find user by id", e))?;

        Ok(row.map(|r| with_version(r, |u: &mut User, v| u.version = v)))
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        let mut stored = user.clone();
        stored.version = 1;

        sqlx::query(
            "INSERT INTO users (id, email, version, document, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(stored.id)
        .bind(&stored.email)
        .bind(stored.version as i64)
        .bind(Json(&stored))
        .bind(stored.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!("User {} already exists", stored.id))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert user", e),
        })?;

        Ok(stored)
    }

    async fn replace(&self, user: &User) -> AppResult<User> {
        let mut stored = user.clone();
        stored.version = user.version + 1;

        let result = sqlx::query(
            "UPDATE users SET email = $2, version = $3, document = $4, updated_at = $5 \
             WHERE id = $1 AND version = $6",
        )
        .bind(stored.id)
        .bind(&stored.email)
        .bind(stored.version as i64)
        .bind(Json(&stored))
        .bind(stored.updated_at)
        .bind(user.version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to replace user", e))?;

        if result.rows_affected() == 0 {
            return match self.current_version(user.id).await? {
                Some(actual) => Err(stale_write("user", user.id, user.version, actual as u64)),
                None => Err(AppError::not_found(format!("User {} not found", user.id))),
            };
        }

        Ok(stored)
    }

    async fn delete(&self, id: &UserId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(*id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete user", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_ids(&self) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list users", e))
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, (Json<User>, i64)>(
            "SELECT document, version FROM users WHERE LOWER(email) = LOWER($1) LIMIT 1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find user by email", e)
        })?;

        Ok(row.map(|r| with_version(r, |u: &mut User, v| u.version = v)))
    }

    async fn list_by_event(&self, event_id: &EventId) -> AppResult<Vec<User>> {
        let filter = serde_json::json!([{ "event_id": event_id }]);

        let rows = sqlx::query_as::<_, (Json<User>, i64)>(
            "SELECT document, version FROM users \
             WHERE document -> 'activities' @> $1 ORDER BY id",
        )
        .bind(Json(filter))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list users by event", e)
        })?;

        Ok(rows
            .into_iter()
            .map(|r| with_version(r, |u: &mut User, v| u.version = v))
            .collect())
    }

    async fn list_activity_event_ids(&self) -> AppResult<Vec<EventId>> {
        sqlx::query_scalar(
            "SELECT DISTINCT (activity ->> 'event_id')::uuid AS event_id \
             FROM users, jsonb_array_elements(document -> 'activities') AS activity \
             ORDER BY event_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list activity event ids", e)
        })
    }
}
