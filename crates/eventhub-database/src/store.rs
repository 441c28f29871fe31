//! Aggregate-specific store traits.

use async_trait::async_trait;

use eventhub_core::error::AppError;
use eventhub_core::result::AppResult;
use eventhub_core::traits::Repository;
use eventhub_core::types::{EventId, UserId};
use eventhub_entity::event::Event;
use eventhub_entity::user::User;

/// Persistence for [`Event`] aggregates.
#[async_trait]
pub trait EventStore: Repository<Event, EventId> {
    /// Find an event by its exact title.
    async fn get_by_title(&self, title: &str) -> AppResult<Option<Event>>;
}

/// Persistence for [`User`] aggregates.
#[async_trait]
pub trait UserStore: Repository<User, UserId> {
    /// Find a user by email (case-insensitive).
    async fn get_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Every user holding an activity record for the event, whatever its status.
    async fn list_by_event(&self, event_id: &EventId) -> AppResult<Vec<User>>;

    /// Distinct ids of every event referenced by any user's activities.
    async fn list_activity_event_ids(&self) -> AppResult<Vec<EventId>>;
}

/// Error for a replace whose version no longer matches the stored one.
pub(crate) fn stale_write(
    kind: &str,
    id: impl std::fmt::Display,
    expected: u64,
    actual: u64,
) -> AppError {
    AppError::conflict(format!(
        "Stale write on {kind} {id}: expected version {expected}, found {actual}"
    ))
}
