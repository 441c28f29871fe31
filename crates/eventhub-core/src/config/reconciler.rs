//! Reconciler configuration.

use serde::{Deserialize, Serialize};

/// Settings for the periodic roster/activity repair pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Whether the periodic reconciler runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Run a full pass once during startup.
    #[serde(default = "default_true")]
    pub run_on_startup: bool,
    /// Cron expression (with seconds) for the periodic pass.
    #[serde(default = "default_schedule")]
    pub schedule: String,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            run_on_startup: true,
            schedule: default_schedule(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_schedule() -> String {
    "0 */10 * * * *".to_string()
}
