//! PostgreSQL event store.

use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;

use eventhub_core::error::{AppError, ErrorKind};
use eventhub_core::result::AppResult;
use eventhub_core::traits::Repository;
use eventhub_core::types::EventId;
use eventhub_entity::event::Event;

use super::with_version;
use crate::store::{EventStore, stale_write};

/// Events stored as JSONB documents in the `events` table.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

impl PgEventStore {
    /// Create a new event store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn current_version(&self, id: EventId) -> AppResult<Option<i64>> {
        sqlx::query_scalar("SELECT version FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to read event version", e)
            })
    }
}

#[async_trait]
impl Repository<Event, EventId> for PgEventStore {
    async fn get_by_id(&self, id: &EventId) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, (Json<Event>, i64)>(
            "SELECT document, version FROM events WHERE id = $1",
        )
        .bind(*id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find event by id", e))?;

        Ok(row.map(|r| with_version(r, |e: &mut Event, v| e.version = v)))
    }

    async fn insert(&self, event: &Event) -> AppResult<Event> {
        let mut stored = event.clone();
        stored.version = 1;

        sqlx::query(
            "INSERT INTO events (id, title, version, document, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(stored.id)
        .bind(&stored.title)
        .bind(stored.version as i64)
        .bind(Json(&stored))
        .bind(stored.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::conflict(format!("Event {} already exists", stored.id))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to insert event", e),
        })?;

        Ok(stored)
    }

    async fn replace(&self, event: &Event) -> AppResult<Event> {
        let mut stored = event.clone();
        stored.version = event.version + 1;

        let result = sqlx::query(
            "UPDATE events SET title = $2, version = $3, document = $4, updated_at = $5 \
             WHERE id = $1 AND version = $6",
        )
        .bind(stored.id)
        .bind(&stored.title)
        .bind(stored.version as i64)
        .bind(Json(&stored))
        .bind(stored.updated_at)
        .bind(event.version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to replace event", e))?;

        if result.rows_affected() == 0 {
            return match self.current_version(event.id).await? {
                Some(actual) => Err(stale_write("event", event.id, event.version, actual as u64)),
                None => Err(AppError::not_found(format!("Event {} not found", event.id))),
            };
        }

        Ok(stored)
    }

    async fn delete(&self, id: &EventId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(*id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete event", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_ids(&self) -> AppResult<Vec<EventId>> {
        sqlx::query_scalar("SELECT id FROM events ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list events", e))
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn get_by_title(&self, title: &str) -> AppResult<Option<Event>> {
        let row = sqlx::query_as::<_, (Json<Event>, i64)>(
            "SELECT document, version FROM events WHERE title = $1 LIMIT 1",
        )
        .bind(title)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find event by title", e)
        })?;

        Ok(row.map(|r| with_version(r, |e: &mut Event, v| e.version = v)))
    }
}
