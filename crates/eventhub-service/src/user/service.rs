//! User account service.

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use eventhub_core::error::{AppError, Reason};
use eventhub_core::result::AppResult;
use eventhub_core::traits::Service;
use eventhub_core::types::{EventId, UserId};
use eventhub_entity::activity::{ActivityRecord, Role};
use eventhub_entity::event::EventStatus;
use eventhub_entity::user::{CreateUser, User};

use crate::aggregates::AggregateStore;
use crate::context::RequestContext;
use crate::locks::KeyedLocks;

/// Creates and deletes users and answers activity queries.
#[derive(Debug, Clone)]
pub struct UserService {
    /// Event and user stores.
    store: AggregateStore,
    /// Per-event serialization barrier.
    event_locks: Arc<KeyedLocks<EventId>>,
    /// Serializes email reservation.
    email_locks: Arc<KeyedLocks<String>>,
}

impl Service for UserService {}

impl UserService {
    /// Creates a new user service.
    pub fn new(store: AggregateStore, event_locks: Arc<KeyedLocks<EventId>>) -> Self {
        Self {
            store,
            event_locks,
            email_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Creates a user with no activities.
    pub async fn create_user(&self, ctx: &RequestContext, req: CreateUser) -> AppResult<User> {
        req.validate()?;
        let email = req.email.trim().to_string();
        let _email = self.email_locks.lock(&email.to_lowercase()).await;

        let users = self.store.users();
        if ctx.guard(self.store.timeout(), users.get_by_email(&email)).await?.is_some() {
            return Err(AppError::rejected(Reason::EmailTaken));
        }

        let mut user = User::new(UserId::new(), email, ctx.request_time);
        user.display_name = req.display_name;

        self.store.begin_writes(ctx)?;
        let user = users.insert(&user).await?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Gets a user by ID.
    pub async fn get_user(&self, ctx: &RequestContext, user_id: &UserId) -> AppResult<User> {
        self.store.load_user(ctx, user_id).await
    }

    /// Every activity record of a user, whatever its status.
    pub async fn get_activities(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
    ) -> AppResult<Vec<ActivityRecord>> {
        let user = self.store.load_user(ctx, user_id).await?;
        Ok(user.activities().to_vec())
    }

    /// Deletes the caller's own account.
    ///
    /// Refused while the user organizes an event that is still open. The
    /// user is deleted first; roster entries on other events are dropped
    /// afterwards, one event at a time.
    pub async fn delete_user(&self, ctx: &RequestContext, user_id: &UserId) -> AppResult<()> {
        if ctx.actor_id != *user_id {
            return Err(AppError::rejected_with(
                Reason::Forbidden,
                "Users can only delete their own account",
            ));
        }
        let user = self.store.load_user(ctx, user_id).await?;
        let now = ctx.request_time;

        let mut rostered: Vec<EventId> = Vec::new();
        for record in user.activities() {
            let Some(event) = self.store.find_event(ctx, &record.event_id).await? else {
                continue;
            };
            if record.role == Role::Organizer && event.effective_status(now) == EventStatus::Open {
                return Err(AppError::rejected_with(
                    Reason::Forbidden,
                    format!("User still organizes open event {}", event.id),
                ));
            }
            if event.roster().contains(user_id) {
                rostered.push(event.id);
            }
        }

        self.store.begin_writes(ctx)?;
        self.store.users().delete(user_id).await?;

        for event_id in &rostered {
            let _event = self.event_locks.lock(event_id).await;
            let detached = async {
                let Some(mut event) = self.store.events().get_by_id(event_id).await? else {
                    return Ok(());
                };
                if event.remove_from_roster(user_id).is_some() {
                    event.touch(now);
                    self.store.events().replace(&event).await?;
                }
                Ok::<(), AppError>(())
            }
            .await;
            if let Err(e) = detached {
                return Err(self.store.partial("delete_user", event_id, &[*user_id], e));
            }
        }

        info!(user_id = %user_id, detached_events = rostered.len(), "User deleted");
        Ok(())
    }
}
