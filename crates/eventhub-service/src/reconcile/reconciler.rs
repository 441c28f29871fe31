//! Membership reconciliation.
//!
//! Activity records are authoritative. For each event the reconciler
//! rebuilds the roster from the users whose record for that event is
//! active, restores the organizer's record, and strips records pointing at
//! events that no longer exist. Running it twice in a row is a no-op.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use eventhub_core::result::AppResult;
use eventhub_core::traits::Service;
use eventhub_core::types::{EventId, UserId};
use eventhub_entity::activity::{ActivityStatus, Role};
use eventhub_entity::user::User;

use crate::aggregates::AggregateStore;
use crate::context::RequestContext;
use crate::locks::KeyedLocks;

/// What one reconciliation of one event changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    pub event_id: EventId,
    /// Users put on the roster or moved to a different roster role.
    pub roster_added: Vec<UserId>,
    /// Users taken off the roster.
    pub roster_removed: Vec<UserId>,
    /// Users whose activity record for the event was deleted.
    pub activities_removed: Vec<UserId>,
    /// Whether the organizer's record had to be recreated.
    pub organizer_restored: bool,
}

impl ReconcileReport {
    fn new(event_id: EventId) -> Self {
        Self {
            event_id,
            ..Self::default()
        }
    }

    /// Check if nothing needed repair.
    pub fn is_clean(&self) -> bool {
        self.roster_added.is_empty()
            && self.roster_removed.is_empty()
            && self.activities_removed.is_empty()
            && !self.organizer_restored
    }
}

/// Outcome of a full pass over every known event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileSummary {
    pub events_checked: usize,
    /// Reports of the events that needed repair.
    pub repaired: Vec<ReconcileReport>,
    /// Events whose reconciliation failed, with the error message.
    pub failed: Vec<(EventId, String)>,
}

/// Idempotent repair pass over the two aggregates.
#[derive(Debug, Clone)]
pub struct MembershipReconciler {
    store: AggregateStore,
    event_locks: Arc<KeyedLocks<EventId>>,
}

impl Service for MembershipReconciler {}

impl MembershipReconciler {
    /// Creates a new reconciler sharing the services' event locks.
    pub fn new(store: AggregateStore, event_locks: Arc<KeyedLocks<EventId>>) -> Self {
        Self { store, event_locks }
    }

    /// Repair one event.
    pub async fn reconcile_event(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
    ) -> AppResult<ReconcileReport> {
        let _event = self.event_locks.lock(event_id).await;
        let mut report = ReconcileReport::new(*event_id);

        let holders = self.store.users_of_event(ctx, event_id).await?;
        let Some(mut event) = self.store.find_event(ctx, event_id).await? else {
            return self.drop_dangling(ctx, event_id, holders, report).await;
        };

        let now = ctx.request_time;
        let organizer_id = event.organizer_id;
        let mut organizer_seen = false;
        let mut dirty_users: Vec<User> = Vec::new();
        let mut desired: BTreeMap<UserId, Role> = BTreeMap::new();

        for mut user in holders {
            let Some(record) = user.activity(event_id) else {
                continue;
            };
            let (role, status) = (record.role, record.status);

            if user.id == organizer_id {
                organizer_seen = true;
                if (role, status) != (Role::Organizer, ActivityStatus::Active) {
                    user.reset_activity(event_id, Role::Organizer, ActivityStatus::Active, now)?;
                    report.organizer_restored = true;
                    dirty_users.push(user);
                }
                continue;
            }
            if role == Role::Organizer {
                user.remove_activity(event_id, now);
                report.activities_removed.push(user.id);
                dirty_users.push(user);
                continue;
            }
            if status == ActivityStatus::Active {
                desired.insert(user.id, role);
            }
        }

        if !organizer_seen {
            if let Some(mut organizer) = self.find_user(ctx, &organizer_id).await? {
                organizer.add_activity(*event_id, Role::Organizer, now)?;
                report.organizer_restored = true;
                dirty_users.push(organizer);
            }
        }

        let current: Vec<(UserId, Role)> = event.roster().iter().collect();
        for (user_id, role) in &current {
            if !desired.contains_key(user_id) {
                event.remove_from_roster(user_id);
                report.roster_removed.push(*user_id);
            } else if desired.get(user_id) != Some(role) {
                report.roster_added.push(*user_id);
            }
        }
        for (user_id, role) in &desired {
            if !event.roster().contains(user_id) {
                report.roster_added.push(*user_id);
            }
            event.add_to_roster(*user_id, *role);
        }

        if report.is_clean() {
            return Ok(report);
        }

        warn!(
            event_id = %event_id,
            roster_added = report.roster_added.len(),
            roster_removed = report.roster_removed.len(),
            activities_removed = report.activities_removed.len(),
            organizer_restored = report.organizer_restored,
            "Membership drift detected, reconciling"
        );

        self.store.begin_writes(ctx)?;
        for user in &dirty_users {
            self.store.users().replace(user).await?;
        }
        if !report.roster_added.is_empty() || !report.roster_removed.is_empty() {
            event.touch(now);
            self.store.events().replace(&event).await?;
        }

        info!(event_id = %event_id, "Event membership reconciled");
        Ok(report)
    }

    /// Repair every event known to either store.
    ///
    /// Each event gets its own context (and so its own deadline) sharing
    /// the caller's cancellation token. A failing event is recorded and
    /// the pass continues.
    pub async fn reconcile_all(&self, ctx: &RequestContext) -> AppResult<ReconcileSummary> {
        let event_ids = self.known_event_ids(ctx).await?;
        let mut summary = ReconcileSummary {
            events_checked: event_ids.len(),
            ..ReconcileSummary::default()
        };

        for event_id in event_ids {
            let event_ctx = RequestContext::system()
                .with_cancellation(ctx.cancellation_token().clone());
            match self.reconcile_event(&event_ctx, &event_id).await {
                Ok(report) if report.is_clean() => {}
                Ok(report) => summary.repaired.push(report),
                Err(e) if ctx.cancellation_token().is_cancelled() => return Err(e),
                Err(e) => {
                    error!(event_id = %event_id, error = %e, "Event reconciliation failed");
                    summary.failed.push((event_id, e.to_string()));
                }
            }
        }

        info!(
            events_checked = summary.events_checked,
            repaired = summary.repaired.len(),
            failed = summary.failed.len(),
            "Reconciliation pass completed"
        );
        self.event_locks.prune();
        Ok(summary)
    }

    /// Event ids from the event store plus every id referenced by an activity.
    async fn known_event_ids(&self, ctx: &RequestContext) -> AppResult<BTreeSet<EventId>> {
        let timeout = self.store.timeout();
        let mut ids: BTreeSet<EventId> = ctx
            .guard(timeout, self.store.events().list_ids())
            .await?
            .into_iter()
            .collect();

        let referenced = ctx
            .guard(timeout, self.store.users().list_activity_event_ids())
            .await?;
        ids.extend(referenced);
        Ok(ids)
    }

    async fn find_user(&self, ctx: &RequestContext, user_id: &UserId) -> AppResult<Option<User>> {
        ctx.guard(self.store.timeout(), self.store.users().get_by_id(user_id))
            .await
    }

    /// The event is gone: strip every record still pointing at it.
    async fn drop_dangling(
        &self,
        ctx: &RequestContext,
        event_id: &EventId,
        holders: Vec<User>,
        mut report: ReconcileReport,
    ) -> AppResult<ReconcileReport> {
        let mut dirty: Vec<User> = Vec::new();
        for mut user in holders {
            if user.remove_activity(event_id, ctx.request_time).is_some() {
                report.activities_removed.push(user.id);
                dirty.push(user);
            }
        }
        if dirty.is_empty() {
            return Ok(report);
        }

        warn!(
            event_id = %event_id,
            removed = dirty.len(),
            "Removing activities of a deleted event"
        );
        self.store.begin_writes(ctx)?;
        for user in &dirty {
            self.store.users().replace(user).await?;
        }
        Ok(report)
    }
}
