//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod logging;
pub mod membership;
pub mod reconciler;
pub mod store;

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use self::logging::LoggingConfig;
pub use self::membership::MembershipConfig;
pub use self::reconciler::ReconcilerConfig;
pub use self::store::{DatabaseConfig, StoreBackend, StoreConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct AppConfig {
    /// Which store backend holds events and users.
    #[serde(default)]
    pub store: StoreConfig,
    /// Database connection settings (postgres backend only).
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Membership rules and per-operation limits.
    #[serde(default)]
    #[validate(nested)]
    pub membership: MembershipConfig,
    /// Roster/activity repair settings.
    #[serde(default)]
    pub reconciler: ReconcilerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `EVENTHUB__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_from("config/default", &format!("config/{env}"))
    }

    /// Load configuration from an explicit base file and overlay.
    pub fn load_from(base: &str, overlay: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(base).required(false))
            .add_source(config::File::with_name(overlay).required(false))
            .add_source(
                config::Environment::with_prefix("EVENTHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        config.validate()?;
        Ok(config)
    }
}
