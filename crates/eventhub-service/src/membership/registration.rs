//! Self-service registration and leave.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use eventhub_core::error::{AppError, Reason};
use eventhub_core::result::AppResult;
use eventhub_core::traits::Service;
use eventhub_core::types::{EventId, UserId};
use eventhub_entity::activity::{ActivityStatus, Role};
use eventhub_entity::event::EventStatus;

use crate::aggregates::AggregateStore;
use crate::context::RequestContext;
use crate::locks::KeyedLocks;
use crate::permission::{Operation, Relation, authorize};

/// Lets users join and leave events on their own behalf.
#[derive(Debug, Clone)]
pub struct RegistrationService {
    /// Event and user stores.
    store: AggregateStore,
    /// Per-event serialization barrier.
    event_locks: Arc<KeyedLocks<EventId>>,
    /// Whether a user who left may register again.
    allow_rejoin_after_leave: bool,
}

/// Roster view of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participants {
    pub event_id: EventId,
    pub status: EventStatus,
    pub organizer_id: UserId,
    pub co_organizers: Vec<UserId>,
    pub standard_participants: Vec<UserId>,
}

impl Service for RegistrationService {}

impl RegistrationService {
    /// Creates a new registration service.
    pub fn new(
        store: AggregateStore,
        event_locks: Arc<KeyedLocks<EventId>>,
        allow_rejoin_after_leave: bool,
    ) -> Self {
        Self {
            store,
            event_locks,
            allow_rejoin_after_leave,
        }
    }

    /// Registers the caller as a standard participant.
    ///
    /// A user who left may come back when rejoining is allowed; a banned
    /// user never can.
    pub async fn register(&self, ctx: &RequestContext, event_id: &EventId) -> AppResult<()> {
        let _event = self.event_locks.lock(event_id).await;

        let mut user = self.store.load_user(ctx, &ctx.actor_id).await?;
        let mut event = self.store.load_event(ctx, event_id).await?;
        let now = ctx.request_time;

        event.ensure_open(now)?;
        authorize(Operation::Register, Relation::of(&event, &user.id), None)
            .map_err(AppError::rejected)?;

        match user.activity(event_id).map(|record| record.status) {
            None => user.add_activity(*event_id, Role::StandardParticipant, now)?,
            Some(ActivityStatus::Active) => {
                return Err(AppError::rejected(Reason::AlreadyRegistered));
            }
            Some(ActivityStatus::Banned) => return Err(AppError::rejected(Reason::UserBanned)),
            Some(ActivityStatus::Left) if self.allow_rejoin_after_leave => user.reset_activity(
                event_id,
                Role::StandardParticipant,
                ActivityStatus::Active,
                now,
            )?,
            Some(ActivityStatus::Left) => {
                return Err(AppError::rejected_with(
                    Reason::AlreadyRegistered,
                    "User left this event and may not register again",
                ));
            }
        }
        event.add_to_roster(user.id, Role::StandardParticipant);
        event.touch(now);

        self.store.commit(ctx, "register", &user, &event).await?;

        info!(event_id = %event_id, user_id = %user.id, "User registered on event");
        Ok(())
    }

    /// Leaves an event. The activity record is kept with status `Left`.
    pub async fn leave(&self, ctx: &RequestContext, event_id: &EventId) -> AppResult<()> {
        let _event = self.event_locks.lock(event_id).await;

        let mut user = self.store.load_user(ctx, &ctx.actor_id).await?;
        let mut event = self.store.load_event(ctx, event_id).await?;
        let now = ctx.request_time;

        authorize(Operation::Leave, Relation::of(&event, &user.id), None)
            .map_err(AppError::rejected)?;
        if user.active_role(event_id).is_none() {
            return Err(AppError::rejected(Reason::NotRegistered));
        }

        user.set_activity_status(event_id, ActivityStatus::Left, now)?;
        event.remove_from_roster(&user.id);
        event.touch(now);

        self.store.commit(ctx, "leave", &user, &event).await?;

        info!(event_id = %event_id, user_id = %user.id, "User left event");
        Ok(())
    }

    /// Organizer, co-organizers, and standard participants of an event.
    pub async fn participants(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
    ) -> AppResult<Participants> {
        let event = self.store.load_event(ctx, event_id).await?;
        Ok(Participants {
            event_id: event.id,
            status: event.effective_status(ctx.request_time),
            organizer_id: event.organizer_id,
            co_organizers: event.roster().co_organizers(),
            standard_participants: event.roster().standard_participants(),
        })
    }
}
