//! Event lifecycle service.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use eventhub_core::error::{AppError, Reason};
use eventhub_core::result::AppResult;
use eventhub_core::traits::Service;
use eventhub_core::types::{EventId, UserId};
use eventhub_entity::activity::Role;
use eventhub_entity::event::{Event, EventDetails};

use crate::aggregates::AggregateStore;
use crate::context::RequestContext;
use crate::locks::KeyedLocks;
use crate::permission::{Operation, Relation, authorize};

/// Creates, updates, cancels, and deletes events.
#[derive(Debug, Clone)]
pub struct EventService {
    /// Event and user stores.
    store: AggregateStore,
    /// Per-event serialization barrier, shared with the membership services.
    event_locks: Arc<KeyedLocks<EventId>>,
    /// Serializes title reservation between concurrent creates/renames.
    title_locks: Arc<KeyedLocks<String>>,
}

/// Request to create a new event.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEventRequest {
    /// Event title, unique across events.
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    /// Description.
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    /// Start of the event window.
    pub starts_at: DateTime<Utc>,
    /// End of the event window.
    pub ends_at: DateTime<Utc>,
}

/// Request to update an existing event. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEventRequest {
    /// New title.
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    /// New description.
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    /// New start.
    pub starts_at: Option<DateTime<Utc>>,
    /// New end.
    pub ends_at: Option<DateTime<Utc>>,
}

impl From<CreateEventRequest> for EventDetails {
    fn from(req: CreateEventRequest) -> Self {
        Self {
            title: req.title,
            description: req.description,
            starts_at: req.starts_at,
            ends_at: req.ends_at,
        }
    }
}

impl UpdateEventRequest {
    fn merge_into(self, mut details: EventDetails) -> EventDetails {
        if let Some(title) = self.title {
            details.title = title;
        }
        if let Some(description) = self.description {
            details.description = description;
        }
        if let Some(starts_at) = self.starts_at {
            details.starts_at = starts_at;
        }
        if let Some(ends_at) = self.ends_at {
            details.ends_at = ends_at;
        }
        details
    }
}

impl Service for EventService {}

impl EventService {
    /// Creates a new event service.
    pub fn new(
        store: AggregateStore,
        event_locks: Arc<KeyedLocks<EventId>>,
        title_locks: Arc<KeyedLocks<String>>,
    ) -> Self {
        Self {
            store,
            event_locks,
            title_locks,
        }
    }

    /// Gets an event by ID.
    pub async fn get_event(&self, ctx: &RequestContext, event_id: &EventId) -> AppResult<Event> {
        self.store.load_event(ctx, event_id).await
    }

    /// Creates an event organized by the caller.
    ///
    /// The event is inserted first, which reserves the title; the
    /// organizer's `{Organizer, Active}` record is written second.
    pub async fn create_event(
        &self,
        ctx: &RequestContext,
        event_id: EventId,
        req: CreateEventRequest,
    ) -> AppResult<Event> {
        req.validate()?;
        let _title = self.title_locks.lock(&req.title).await;
        let _event = self.event_locks.lock(&event_id).await;

        let mut organizer = self.store.load_user(ctx, &ctx.actor_id).await?;
        if self.store.find_event_by_title(ctx, &req.title).await?.is_some() {
            return Err(AppError::rejected(Reason::EventTitleReserved));
        }

        let now = ctx.request_time;
        let event = Event::create(event_id, organizer.id, req.into(), now)?;
        organizer.add_activity(event_id, Role::Organizer, now)?;

        self.store.begin_writes(ctx)?;
        let event = self.store.events().insert(&event).await?;
        if let Err(e) = self.store.users().replace(&organizer).await {
            return Err(self.store.partial("create_event", &event_id, &[], e));
        }

        info!(
            event_id = %event.id,
            organizer_id = %event.organizer_id,
            title = %event.title,
            "Event created"
        );

        Ok(event)
    }

    /// Updates title, description, or window of an open event.
    pub async fn update_event(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        req: UpdateEventRequest,
    ) -> AppResult<Event> {
        req.validate()?;
        let _title = match &req.title {
            Some(title) => Some(self.title_locks.lock(title).await),
            None => None,
        };
        let _event = self.event_locks.lock(event_id).await;

        let (actor, mut event) = self.load_for(ctx, event_id).await?;
        authorize(Operation::UpdateEvent, Relation::of(&event, &actor), None)
            .map_err(AppError::rejected)?;
        event.ensure_open(ctx.request_time)?;

        let details = req.merge_into(event.details());
        if details.title != event.title {
            let taken = self.store.find_event_by_title(ctx, &details.title).await?;
            if taken.is_some_and(|other| other.id != event.id) {
                return Err(AppError::rejected(Reason::EventTitleReserved));
            }
        }
        event.apply_details(details, ctx.request_time)?;

        self.store.begin_writes(ctx)?;
        let event = self.store.events().replace(&event).await?;

        info!(event_id = %event.id, actor_id = %actor, "Event updated");
        Ok(event)
    }

    /// Cancels an open event. The roster is left as it is.
    pub async fn cancel_event(&self, ctx: &RequestContext, event_id: &EventId) -> AppResult<Event> {
        let _event = self.event_locks.lock(event_id).await;

        let (actor, mut event) = self.load_for(ctx, event_id).await?;
        authorize(Operation::CancelEvent, Relation::of(&event, &actor), None)
            .map_err(AppError::rejected)?;
        event.cancel(ctx.request_time)?;

        self.store.begin_writes(ctx)?;
        let event = self.store.events().replace(&event).await?;

        info!(event_id = %event.id, actor_id = %actor, "Event canceled");
        Ok(event)
    }

    /// Attaches a thumbnail image to an open event.
    pub async fn set_thumbnail(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        image: Bytes,
    ) -> AppResult<Event> {
        if image.is_empty() {
            return Err(AppError::validation("Thumbnail image is empty"));
        }
        let _event = self.event_locks.lock(event_id).await;

        let (actor, mut event) = self.load_for(ctx, event_id).await?;
        authorize(Operation::UpdateEvent, Relation::of(&event, &actor), None)
            .map_err(AppError::rejected)?;
        event.ensure_open(ctx.request_time)?;
        event.set_thumbnail(image, ctx.request_time);

        self.store.begin_writes(ctx)?;
        let event = self.store.events().replace(&event).await?;

        info!(event_id = %event.id, actor_id = %actor, "Event thumbnail set");
        Ok(event)
    }

    /// Deletes an event and every activity record that refers to it.
    ///
    /// Users are written first, one at a time; the event is deleted last.
    /// If a write fails after at least one user was updated the error is a
    /// partial write. The event stays in the store until the delete is
    /// retried; the reconciler only realigns the remaining records with it.
    pub async fn delete_event(&self, ctx: &RequestContext, event_id: &EventId) -> AppResult<()> {
        let _event = self.event_locks.lock(event_id).await;

        let (actor, event) = self.load_for(ctx, event_id).await?;
        authorize(Operation::DeleteEvent, Relation::of(&event, &actor), None)
            .map_err(AppError::rejected)?;

        let members = self.store.users_of_event(ctx, event_id).await?;
        let now = ctx.request_time;

        self.store.begin_writes(ctx)?;
        let mut written: Vec<UserId> = Vec::with_capacity(members.len());
        for mut member in members {
            if member.remove_activity(event_id, now).is_none() {
                continue;
            }
            if let Err(e) = self.store.users().replace(&member).await {
                return Err(self.fail_after(&written, event_id, e));
            }
            written.push(member.id);
        }

        if let Err(e) = self.store.events().delete(event_id).await {
            return Err(self.fail_after(&written, event_id, e));
        }

        info!(
            event_id = %event_id,
            actor_id = %actor,
            detached_users = written.len(),
            "Event deleted"
        );

        Ok(())
    }

    /// Resolve the actor (must exist) and then the event.
    async fn load_for(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
    ) -> AppResult<(UserId, Event)> {
        let actor = self.store.load_user(ctx, &ctx.actor_id).await?;
        let event = self.store.load_event(ctx, event_id).await?;
        Ok((actor.id, event))
    }

    fn fail_after(&self, written: &[UserId], event_id: &EventId, cause: AppError) -> AppError {
        if written.is_empty() {
            cause
        } else {
            self.store.partial("delete_event", event_id, written, cause)
        }
    }
}
