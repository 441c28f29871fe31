//! Database migration commands.

use clap::{Args, Subcommand};

use eventhub_core::config::AppConfig;
use eventhub_core::error::AppError;

use crate::output;

/// Arguments for the migrate command
#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Migration subcommand
    #[command(subcommand)]
    pub command: MigrateCommand,
}

/// Migration subcommands
#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Run all pending migrations
    Run,
    /// Check that the database answers
    Ping,
}

/// Execute migration commands
pub async fn execute(args: &MigrateArgs, config: &AppConfig) -> Result<(), AppError> {
    let pool = super::connect(config).await?;

    match &args.command {
        MigrateCommand::Run => {
            println!("Running database migrations...");
            eventhub_database::migration::run_migrations(pool.pool()).await?;
            output::print_success("All migrations applied successfully.");
        }
        MigrateCommand::Ping => {
            if pool.health_check().await? {
                output::print_success("Database is reachable.");
            } else {
                output::print_warning("Database answered unexpectedly.");
            }
        }
    }

    pool.close().await;
    Ok(())
}
