//! Crew moderation: promoting, demoting, removing, and banning participants.

use std::sync::Arc;

use tracing::info;

use eventhub_core::error::{AppError, Reason};
use eventhub_core::result::AppResult;
use eventhub_core::traits::Service;
use eventhub_core::types::{EventId, UserId};
use eventhub_entity::activity::{ActivityStatus, Role};
use eventhub_entity::event::Event;
use eventhub_entity::user::User;

use crate::aggregates::AggregateStore;
use crate::context::RequestContext;
use crate::locks::KeyedLocks;
use crate::permission::{Operation, Relation, authorize};

/// Transitions one crew member applies to another user on an event.
#[derive(Debug, Clone)]
pub struct CrewService {
    /// Event and user stores.
    store: AggregateStore,
    /// Per-event serialization barrier.
    event_locks: Arc<KeyedLocks<EventId>>,
}

/// Aggregates loaded for a crew transition, already authorized.
struct Loaded {
    target: User,
    event: Event,
}

impl Service for CrewService {}

impl CrewService {
    /// Creates a new crew service.
    pub fn new(store: AggregateStore, event_locks: Arc<KeyedLocks<EventId>>) -> Self {
        Self { store, event_locks }
    }

    /// Promotes a user to co-organizer.
    ///
    /// An active standard participant is demoted first: their record and
    /// roster entry are replaced rather than duplicated.
    pub async fn add_co_organizer(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        candidate_id: &UserId,
    ) -> AppResult<()> {
        let _event = self.event_locks.lock(event_id).await;
        let Loaded {
            target: mut candidate,
            mut event,
        } = self
            .load(ctx, Operation::AddCoOrganizer, event_id, candidate_id)
            .await?;
        let now = ctx.request_time;

        if candidate
            .activity(event_id)
            .is_some_and(|record| record.status == ActivityStatus::Banned)
        {
            return Err(AppError::rejected(Reason::UserBanned));
        }

        if candidate.remove_activity(event_id, now).is_some() {
            event.remove_from_roster(&candidate.id);
        }
        candidate.add_activity(*event_id, Role::CoOrganizer, now)?;
        event.add_to_roster(candidate.id, Role::CoOrganizer);
        event.touch(now);

        self.store
            .commit(ctx, "add_co_organizer", &candidate, &event)
            .await?;

        info!(
            event_id = %event_id,
            user_id = %candidate.id,
            actor_id = %ctx.actor_id,
            "Co-organizer added"
        );
        Ok(())
    }

    /// Demotes a co-organizer back to an active standard participant.
    pub async fn remove_co_organizer(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        co_organizer_id: &UserId,
    ) -> AppResult<()> {
        let _event = self.event_locks.lock(event_id).await;
        let Loaded {
            mut target,
            mut event,
        } = self
            .load(ctx, Operation::RemoveCoOrganizer, event_id, co_organizer_id)
            .await?;
        let now = ctx.request_time;

        let Some(record) = target.activity(event_id) else {
            return Err(AppError::rejected(Reason::NotRegistered));
        };
        if record.active_role() != Some(Role::CoOrganizer) {
            return Err(AppError::rejected(Reason::InvalidRole));
        }

        target.reset_activity(
            event_id,
            Role::StandardParticipant,
            ActivityStatus::Active,
            now,
        )?;
        event.add_to_roster(target.id, Role::StandardParticipant);
        event.touch(now);

        self.store
            .commit(ctx, "remove_co_organizer", &target, &event)
            .await?;

        info!(
            event_id = %event_id,
            user_id = %target.id,
            actor_id = %ctx.actor_id,
            "Co-organizer demoted to participant"
        );
        Ok(())
    }

    /// Detaches a participant from the event, deleting their record.
    pub async fn remove_participant(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        user_id: &UserId,
    ) -> AppResult<()> {
        let _event = self.event_locks.lock(event_id).await;
        let Loaded {
            mut target,
            mut event,
        } = self
            .load(ctx, Operation::RemoveParticipant, event_id, user_id)
            .await?;
        let now = ctx.request_time;

        if target.active_role(event_id).is_none() {
            return Err(AppError::rejected(Reason::NotRegistered));
        }
        target.remove_activity(event_id, now);
        event.remove_from_roster(&target.id);
        event.touch(now);

        self.store
            .commit(ctx, "remove_participant", &target, &event)
            .await?;

        info!(
            event_id = %event_id,
            user_id = %target.id,
            actor_id = %ctx.actor_id,
            "Participant removed"
        );
        Ok(())
    }

    /// Bans a participant. The record stays, marked `Banned`.
    pub async fn ban_participant(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        user_id: &UserId,
    ) -> AppResult<()> {
        let _event = self.event_locks.lock(event_id).await;
        let Loaded {
            mut target,
            mut event,
        } = self
            .load(ctx, Operation::BanParticipant, event_id, user_id)
            .await?;
        let now = ctx.request_time;

        if target.active_role(event_id).is_none() {
            return Err(AppError::rejected(Reason::NotRegistered));
        }
        target.set_activity_status(event_id, ActivityStatus::Banned, now)?;
        event.remove_from_roster(&target.id);
        event.touch(now);

        self.store
            .commit(ctx, "ban_participant", &target, &event)
            .await?;

        info!(
            event_id = %event_id,
            user_id = %target.id,
            actor_id = %ctx.actor_id,
            "Participant banned"
        );
        Ok(())
    }

    /// Load actor, target, and event in that order, then run the matrix.
    async fn load(
        &self,
        ctx: &RequestContext,
        op: Operation,
        event_id: &EventId,
        target_id: &UserId,
    ) -> AppResult<Loaded> {
        let actor = self.store.load_user(ctx, &ctx.actor_id).await?;
        let target = self.store.load_user(ctx, target_id).await?;
        let event = self.store.load_event(ctx, event_id).await?;

        authorize(
            op,
            Relation::of(&event, &actor.id),
            Some(Relation::of(&event, &target.id)),
        )
        .map_err(AppError::rejected)?;

        Ok(Loaded { target, event })
    }
}
