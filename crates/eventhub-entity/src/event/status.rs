//! Event lifecycle status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of an event.
///
/// Only `Open` and `Canceled` are ever stored. `Finished` is derived from
/// the event window by [`Event::effective_status`](super::Event::effective_status).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    /// Accepting registrations.
    Open,
    /// Canceled by the crew.
    Canceled,
    /// The event window has ended.
    Finished,
}

impl EventStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Canceled => "canceled",
            Self::Finished => "finished",
        }
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
