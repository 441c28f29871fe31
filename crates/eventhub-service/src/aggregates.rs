//! Loading and persisting the two membership aggregates.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use eventhub_core::error::{AppError, ErrorKind, Reason};
use eventhub_core::result::AppResult;
use eventhub_core::types::{EventId, UserId};
use eventhub_database::store::{EventStore, UserStore};
use eventhub_entity::event::Event;
use eventhub_entity::user::User;

use crate::context::RequestContext;

/// Both stores plus the default operation deadline.
///
/// Every read goes through [`RequestContext::guard`]. Writes follow one
/// order: the user (activity) first, the event (roster) second. Once the
/// first write has succeeded a later failure is reported as a partial
/// write rather than as the store's own error.
#[derive(Clone)]
pub struct AggregateStore {
    events: Arc<dyn EventStore>,
    users: Arc<dyn UserStore>,
    timeout: Duration,
}

impl fmt::Debug for AggregateStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregateStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AggregateStore {
    /// Creates a store pair with the given fallback deadline.
    pub fn new(events: Arc<dyn EventStore>, users: Arc<dyn UserStore>, timeout: Duration) -> Self {
        Self {
            events,
            users,
            timeout,
        }
    }

    pub fn events(&self) -> &Arc<dyn EventStore> {
        &self.events
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    /// Deadline applied when the caller set none.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load an event or fail with `EventNotFound`.
    pub async fn load_event(&self, ctx: &RequestContext, id: &EventId) -> AppResult<Event> {
        self.find_event(ctx, id)
            .await?
            .ok_or_else(|| AppError::rejected(Reason::EventNotFound))
    }

    pub async fn find_event(&self, ctx: &RequestContext, id: &EventId) -> AppResult<Option<Event>> {
        ctx.guard(self.timeout, self.events.get_by_id(id)).await
    }

    /// Load a user or fail with `UserNotFound`.
    pub async fn load_user(&self, ctx: &RequestContext, id: &UserId) -> AppResult<User> {
        ctx.guard(self.timeout, self.users.get_by_id(id))
            .await?
            .ok_or_else(|| AppError::rejected(Reason::UserNotFound))
    }

    pub async fn find_event_by_title(
        &self,
        ctx: &RequestContext,
        title: &str,
    ) -> AppResult<Option<Event>> {
        ctx.guard(self.timeout, self.events.get_by_title(title)).await
    }

    /// Every user holding any activity record for the event.
    pub async fn users_of_event(&self, ctx: &RequestContext, id: &EventId) -> AppResult<Vec<User>> {
        ctx.guard(self.timeout, self.users.list_by_event(id)).await
    }

    /// Last cancellation/deadline check before an operation starts writing.
    pub fn begin_writes(&self, ctx: &RequestContext) -> AppResult<()> {
        ctx.ensure_active(self.timeout)
    }

    /// Persist a transition that touched one user and one event.
    ///
    /// The user is written first; if that fails nothing was applied and
    /// the error is returned unchanged. If the event write then fails the
    /// user already reflects the transition, so the result is a
    /// `PartialWrite` for the reconciler to repair.
    pub async fn commit(
        &self,
        ctx: &RequestContext,
        operation: &'static str,
        user: &User,
        event: &Event,
    ) -> AppResult<(User, Event)> {
        self.begin_writes(ctx)?;

        let user = self.users.replace(user).await.inspect_err(|e| {
            if e.kind == ErrorKind::Conflict {
                warn!(operation, user_id = %user.id, error = %e, "Stale user write rejected");
            }
        })?;

        match self.events.replace(event).await {
            Ok(event) => Ok((user, event)),
            Err(e) => Err(self.partial(operation, &event.id, &[user.id], e)),
        }
    }

    /// Build (and log) the error for a multi-write that stopped half way.
    pub fn partial(
        &self,
        operation: &'static str,
        event_id: &EventId,
        written_users: &[UserId],
        cause: AppError,
    ) -> AppError {
        error!(
            operation,
            event_id = %event_id,
            written_users = ?written_users,
            error = %cause,
            "Membership write applied partially; reconciliation required"
        );
        AppError::partial_write(
            format!("{operation} on event {event_id} was applied partially"),
            cause,
        )
    }
}
