//! Membership rule configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Tunables for the membership orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MembershipConfig {
    /// Whether a user who left an event may register on it again.
    /// Banned users can never re-register.
    #[serde(default = "default_true")]
    pub allow_rejoin_after_leave: bool,
    /// Deadline applied to an operation when the caller supplies none.
    #[serde(default = "default_operation_timeout")]
    #[validate(range(min = 1, max = 300))]
    pub operation_timeout_seconds: u64,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            allow_rejoin_after_leave: true,
            operation_timeout_seconds: default_operation_timeout(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_operation_timeout() -> u64 {
    10
}
