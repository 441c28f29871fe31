//! Event role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a user holds on one event. Mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Created the event. Tracked by `Event::organizer_id`, never on the roster.
    Organizer,
    /// Crew member appointed by the organizer.
    CoOrganizer,
    /// Regular attendee.
    StandardParticipant,
}

impl Role {
    /// Whether this role is stored in an event roster.
    pub fn is_roster_role(&self) -> bool {
        matches!(self, Self::CoOrganizer | Self::StandardParticipant)
    }

    /// Whether this role belongs to the event crew.
    pub fn is_crew(&self) -> bool {
        matches!(self, Self::Organizer | Self::CoOrganizer)
    }

    /// Return the role as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organizer => "organizer",
            Self::CoOrganizer => "co_organizer",
            Self::StandardParticipant => "standard_participant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = eventhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "organizer" => Ok(Self::Organizer),
            "co_organizer" => Ok(Self::CoOrganizer),
            "standard_participant" => Ok(Self::StandardParticipant),
            _ => Err(eventhub_core::AppError::validation(format!(
                "Invalid role: '{s}'. Expected one of: organizer, co_organizer, standard_participant"
            ))),
        }
    }
}
