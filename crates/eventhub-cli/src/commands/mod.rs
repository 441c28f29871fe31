//! CLI command definitions and dispatch.

pub mod event;
pub mod migrate;
pub mod reconcile;
pub mod user;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use eventhub_core::config::AppConfig;
use eventhub_core::error::AppError;
use eventhub_database::DatabasePool;
use eventhub_service::Services;

use crate::output::OutputFormat;

/// EventHub — event membership administration
#[derive(Debug, Parser)]
#[command(name = "eventhub", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (`config/<env>.toml` overlay)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Repair roster/activity drift
    Reconcile(reconcile::ReconcileArgs),
    /// Inspect events
    Event(event::EventArgs),
    /// Inspect users
    User(user::UserArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = AppConfig::load(&self.env)?;
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Reconcile(args) => reconcile::execute(args, &config, self.format).await,
            Commands::Event(args) => event::execute(args, &config, self.format).await,
            Commands::User(args) => user::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: open the PostgreSQL pool named by the configuration.
pub async fn connect(config: &AppConfig) -> Result<DatabasePool, AppError> {
    DatabasePool::connect(&config.database).await
}

/// Helper: services over the PostgreSQL stores.
pub async fn services(config: &AppConfig) -> Result<Services, AppError> {
    let pool = connect(config).await?;
    let (events, users) = pool.stores();
    Ok(Services::new(
        Arc::new(events),
        Arc::new(users),
        &config.membership,
    ))
}

/// Helper: parse an id argument.
pub fn parse_id<T>(raw: &str, what: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
{
    raw.parse()
        .map_err(|_| AppError::validation(format!("Invalid {what} id: {raw}")))
}
