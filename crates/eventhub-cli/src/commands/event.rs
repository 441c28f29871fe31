//! Event inspection commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use eventhub_core::config::AppConfig;
use eventhub_core::error::AppError;
use eventhub_core::types::EventId;
use eventhub_entity::activity::Role;
use eventhub_service::RequestContext;

use crate::output::{self, OutputFormat};

/// Arguments for the event command
#[derive(Debug, Args)]
pub struct EventArgs {
    /// Event subcommand
    #[command(subcommand)]
    pub command: EventCommand,
}

/// Event subcommands
#[derive(Debug, Subcommand)]
pub enum EventCommand {
    /// Show an event and its participants
    Show {
        /// Event ID
        id: String,
        /// Only list members holding this role
        #[arg(long)]
        role: Option<String>,
    },
}

/// One participant row.
#[derive(Debug, Serialize, Tabled)]
struct MemberRow {
    #[tabled(rename = "User")]
    user_id: String,
    #[tabled(rename = "Role")]
    role: Role,
}

/// Execute event commands
pub async fn execute(
    args: &EventArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::services(config).await?;
    let ctx = RequestContext::system();

    match &args.command {
        EventCommand::Show { id, role } => {
            let event_id: EventId = super::parse_id(id, "event")?;
            let role = role.as_deref().map(str::parse::<Role>).transpose()?;
            let event = services.events.get_event(&ctx, &event_id).await?;
            let participants = services.registration.participants(&ctx, &event_id).await?;

            if format == OutputFormat::Table {
                println!("{} ({})", event.title, event.id);
                println!(
                    "  {} → {}  [{}]",
                    event.starts_at.to_rfc3339(),
                    event.ends_at.to_rfc3339(),
                    participants.status
                );
            }

            let rows: Vec<MemberRow> = std::iter::once((participants.organizer_id, Role::Organizer))
                .chain(event.roster().iter())
                .filter(|(_, held)| role.is_none_or(|wanted| wanted == *held))
                .map(|(user_id, role)| MemberRow {
                    user_id: user_id.to_string(),
                    role,
                })
                .collect();
            output::print_rows(&rows, &participants, format);
        }
    }

    Ok(())
}
