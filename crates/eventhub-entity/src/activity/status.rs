//! Activity status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Status of a user's activity on one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    /// Currently holds the role.
    Active,
    /// Left voluntarily. The record is kept.
    Left,
    /// Banned by the crew. The record is kept.
    Banned,
}

impl ActivityStatus {
    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Left => "left",
            Self::Banned => "banned",
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActivityStatus {
    type Err = eventhub_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "left" => Ok(Self::Left),
            "banned" => Ok(Self::Banned),
            _ => Err(eventhub_core::AppError::validation(format!(
                "Invalid activity status: '{s}'. Expected one of: active, left, banned"
            ))),
        }
    }
}
