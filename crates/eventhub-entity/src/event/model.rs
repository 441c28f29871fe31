//! Event aggregate model.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use eventhub_core::error::{AppError, Reason};
use eventhub_core::types::{EventId, UserId};

use super::roster::Roster;
use super::status::EventStatus;
use crate::activity::Role;

/// Scheduling metadata supplied when creating or updating an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    /// Unique event title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Start of the event window.
    pub starts_at: DateTime<Utc>,
    /// End of the event window. Strictly after `starts_at`.
    pub ends_at: DateTime<Utc>,
}

impl EventDetails {
    /// Check the window: it must end after it starts and not start in the past.
    pub fn validate_window(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        if self.ends_at <= self.starts_at {
            return Err(AppError::rejected_with(
                Reason::InvalidEventWindow,
                "Event must end after it starts",
            ));
        }
        if self.starts_at < now {
            return Err(AppError::rejected_with(
                Reason::InvalidEventWindow,
                "Event cannot start in the past",
            ));
        }
        Ok(())
    }
}

/// An event and its participant roster.
///
/// The organizer is stored only in `organizer_id` and is never a roster
/// member. Roster changes go through [`Event::add_to_roster`] and
/// [`Event::remove_from_roster`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier, assigned by the caller at creation.
    pub id: EventId,
    /// The user who created the event. Immutable.
    pub organizer_id: UserId,
    /// Unique title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Start of the event window.
    pub starts_at: DateTime<Utc>,
    /// End of the event window.
    pub ends_at: DateTime<Utc>,
    /// Stored lifecycle status (`Open` or `Canceled`).
    pub status: EventStatus,
    /// Co-organizers and standard participants.
    roster: Roster,
    /// Optional thumbnail image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Bytes>,
    /// When the event was created.
    pub created_at: DateTime<Utc>,
    /// When the event was last updated.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, managed by the store.
    #[serde(default)]
    pub version: u64,
}

impl Event {
    /// Create a new open event with an empty roster.
    ///
    /// Fails with `InvalidEventWindow` if the window is empty, reversed, or
    /// starts before `now`.
    pub fn create(
        id: EventId,
        organizer_id: UserId,
        details: EventDetails,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        details.validate_window(now)?;

        Ok(Self {
            id,
            organizer_id,
            title: details.title,
            description: details.description,
            starts_at: details.starts_at,
            ends_at: details.ends_at,
            status: EventStatus::Open,
            roster: Roster::new(),
            thumbnail: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    /// Read-only view of the roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Check if the user created this event.
    pub fn is_organizer(&self, user_id: &UserId) -> bool {
        self.organizer_id == *user_id
    }

    /// Check if the user is a co-organizer.
    pub fn is_co_organizer(&self, user_id: &UserId) -> bool {
        self.roster.role_of(user_id) == Some(Role::CoOrganizer)
    }

    /// Check if the user is a standard participant.
    pub fn is_standard_participant(&self, user_id: &UserId) -> bool {
        self.roster.role_of(user_id) == Some(Role::StandardParticipant)
    }

    /// The user's current role on this event, organizer included.
    pub fn role_of(&self, user_id: &UserId) -> Option<Role> {
        if self.is_organizer(user_id) {
            Some(Role::Organizer)
        } else {
            self.roster.role_of(user_id)
        }
    }

    /// Check if the user is the organizer or a co-organizer.
    pub fn is_crew(&self, user_id: &UserId) -> bool {
        self.role_of(user_id).is_some_and(|role| role.is_crew())
    }

    /// Put the user on the roster under `role`.
    ///
    /// Ignored (returns `false`) for the organizer and for roles that are
    /// not roster roles.
    pub fn add_to_roster(&mut self, user_id: UserId, role: Role) -> bool {
        if self.is_organizer(&user_id) {
            return false;
        }
        self.roster.insert(user_id, role)
    }

    /// Take the user off the roster, returning the role they held.
    pub fn remove_from_roster(&mut self, user_id: &UserId) -> Option<Role> {
        self.roster.remove(user_id)
    }

    /// Status as observed at `now`: an open event whose window has ended
    /// is `Finished`.
    pub fn effective_status(&self, now: DateTime<Utc>) -> EventStatus {
        match self.status {
            EventStatus::Open if self.ends_at <= now => EventStatus::Finished,
            status => status,
        }
    }

    /// Check if users may register at `now`.
    pub fn is_open_for_registration(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == EventStatus::Open
    }

    /// Fail unless users may register at `now`.
    pub fn ensure_open(&self, now: DateTime<Utc>) -> Result<(), AppError> {
        match self.effective_status(now) {
            EventStatus::Open => Ok(()),
            EventStatus::Finished => Err(AppError::rejected(Reason::EventFinished)),
            EventStatus::Canceled => Err(AppError::rejected(Reason::EventNotOpen)),
        }
    }

    /// Mark the event canceled. Only an open event can be canceled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), AppError> {
        self.ensure_open(now).map_err(|e| {
            AppError::rejected_with(
                Reason::EventNotOpen,
                format!("Event cannot be canceled: {}", e.message),
            )
        })?;
        self.status = EventStatus::Canceled;
        self.updated_at = now;
        Ok(())
    }

    /// Replace the scheduling metadata.
    ///
    /// The window must still end after it starts; a moved start time must
    /// not lie before `now`.
    pub fn apply_details(
        &mut self,
        details: EventDetails,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        if details.starts_at != self.starts_at {
            details.validate_window(now)?;
        } else if details.ends_at <= details.starts_at {
            return Err(AppError::rejected_with(
                Reason::InvalidEventWindow,
                "Event must end after it starts",
            ));
        }
        self.title = details.title;
        self.description = details.description;
        self.starts_at = details.starts_at;
        self.ends_at = details.ends_at;
        self.updated_at = now;
        Ok(())
    }

    /// Current scheduling metadata.
    pub fn details(&self) -> EventDetails {
        EventDetails {
            title: self.title.clone(),
            description: self.description.clone(),
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        }
    }

    /// Attach or replace the thumbnail.
    pub fn set_thumbnail(&mut self, image: Bytes, now: DateTime<Utc>) {
        self.thumbnail = Some(image);
        self.updated_at = now;
    }

    /// Bump `updated_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
