//! Activity record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventhub_core::types::EventId;

use super::role::Role;
use super::status::ActivityStatus;

/// A user's role and status on one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// The event this record refers to.
    pub event_id: EventId,
    /// Current role on the event.
    pub role: Role,
    /// Current status on the event.
    pub status: ActivityStatus,
    /// When the role or status last changed.
    pub updated_at: DateTime<Utc>,
}

impl ActivityRecord {
    /// Create an active record.
    pub fn active(event_id: EventId, role: Role, now: DateTime<Utc>) -> Self {
        Self {
            event_id,
            role,
            status: ActivityStatus::Active,
            updated_at: now,
        }
    }

    /// Check if the record currently grants its role.
    pub fn is_active(&self) -> bool {
        self.status == ActivityStatus::Active
    }

    /// The role, if the record is active.
    pub fn active_role(&self) -> Option<Role> {
        self.is_active().then_some(self.role)
    }
}
