//! User inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use eventhub_core::config::AppConfig;
use eventhub_core::error::AppError;
use eventhub_core::types::UserId;
use eventhub_entity::activity::{ActivityStatus, Role};
use eventhub_service::RequestContext;

use crate::output::{self, OutputFormat};

/// Arguments for the user command
#[derive(Debug, Args)]
pub struct UserArgs {
    /// User subcommand
    #[command(subcommand)]
    pub command: UserCommand,
}

/// User subcommands
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List a user's activity records
    Activities {
        /// User ID
        id: String,
        /// Only show records with this status (active, left, banned)
        #[arg(long)]
        status: Option<String>,
    },
}

/// One activity row.
#[derive(Debug, Serialize, Tabled)]
struct ActivityRow {
    #[tabled(rename = "Event")]
    event_id: String,
    #[tabled(rename = "Role")]
    role: Role,
    #[tabled(rename = "Status")]
    status: ActivityStatus,
    #[tabled(rename = "Updated")]
    updated_at: String,
}

/// Execute user commands
pub async fn execute(
    args: &UserArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::services(config).await?;
    let ctx = RequestContext::system();

    match &args.command {
        UserCommand::Activities { id, status } => {
            let user_id: UserId = super::parse_id(id, "user")?;
            let status = status
                .as_deref()
                .map(str::parse::<ActivityStatus>)
                .transpose()?;
            let mut activities = services.users.get_activities(&ctx, &user_id).await?;
            if let Some(status) = status {
                activities.retain(|record| record.status == status);
            }

            let rows: Vec<ActivityRow> = activities
                .iter()
                .map(|record| ActivityRow {
                    event_id: record.event_id.to_string(),
                    role: record.role,
                    status: record.status,
                    updated_at: record.updated_at.format("%Y-%m-%d %H:%M").to_string(),
                })
                .collect();
            output::print_rows(&rows, &activities, format);
        }
    }

    Ok(())
}
