//! User aggregate model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use eventhub_core::error::{AppError, Reason};
use eventhub_core::types::{EventId, UserId};

use crate::activity::{ActivityRecord, ActivityStatus, Role};

/// A registered user and their per-event activity history.
///
/// Holds at most one [`ActivityRecord`] per event. Records are added when
/// the user first gets a role on an event, updated in place on role or
/// status changes, and removed only when the user is detached from the
/// event entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique email address.
    pub email: String,
    /// Human-readable display name.
    pub display_name: Option<String>,
    /// One record per event.
    #[serde(default)]
    activities: Vec<ActivityRecord>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, managed by the store.
    #[serde(default)]
    pub version: u64,
}

/// Data required to create a new user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Display name (optional).
    #[validate(length(min = 1, max = 100))]
    pub display_name: Option<String>,
}

impl User {
    /// Create a user with no activities.
    pub fn new(id: UserId, email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email: email.into(),
            display_name: None,
            activities: Vec::new(),
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Every activity record.
    pub fn activities(&self) -> &[ActivityRecord] {
        &self.activities
    }

    /// The record for one event.
    pub fn activity(&self, event_id: &EventId) -> Option<&ActivityRecord> {
        self.activities.iter().find(|a| a.event_id == *event_id)
    }

    /// Check if any record exists for the event, whatever its status.
    pub fn has_activity(&self, event_id: &EventId) -> bool {
        self.activity(event_id).is_some()
    }

    /// The role the user currently holds on the event, if the record is active.
    pub fn active_role(&self, event_id: &EventId) -> Option<Role> {
        self.activity(event_id).and_then(ActivityRecord::active_role)
    }

    /// Add an active record. Fails with `DuplicateActivity` if one exists.
    pub fn add_activity(
        &mut self,
        event_id: EventId,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if self.has_activity(&event_id) {
            return Err(AppError::rejected(Reason::DuplicateActivity));
        }
        self.activities.push(ActivityRecord::active(event_id, role, now));
        self.updated_at = now;
        Ok(())
    }

    /// Change the status of an existing record.
    pub fn set_activity_status(
        &mut self,
        event_id: &EventId,
        status: ActivityStatus,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let record = self.activity_mut(event_id)?;
        record.status = status;
        record.updated_at = now;
        self.updated_at = now;
        Ok(())
    }

    /// Overwrite role and status of an existing record.
    pub fn reset_activity(
        &mut self,
        event_id: &EventId,
        role: Role,
        status: ActivityStatus,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let record = self.activity_mut(event_id)?;
        record.role = role;
        record.status = status;
        record.updated_at = now;
        self.updated_at = now;
        Ok(())
    }

    /// Remove the record for an event. No-op if absent.
    pub fn remove_activity(
        &mut self,
        event_id: &EventId,
        now: DateTime<Utc>,
    ) -> Option<ActivityRecord> {
        let index = self.activities.iter().position(|a| a.event_id == *event_id)?;
        self.updated_at = now;
        Some(self.activities.remove(index))
    }

    fn activity_mut(&mut self, event_id: &EventId) -> Result<&mut ActivityRecord, AppError> {
        self.activities
            .iter_mut()
            .find(|a| a.event_id == *event_id)
            .ok_or_else(|| AppError::rejected(Reason::ActivityNotFound))
    }
}
