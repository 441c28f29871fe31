//! Membership reconciliation commands.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use eventhub_core::config::AppConfig;
use eventhub_core::error::AppError;
use eventhub_core::types::EventId;
use eventhub_service::{ReconcileReport, RequestContext};

use crate::output::{self, OutputFormat};

/// Arguments for the reconcile command
#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Only reconcile this event
    #[arg(long)]
    pub event: Option<String>,
    /// Skip confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Table row for a repaired event.
#[derive(Debug, Serialize, Tabled)]
struct ReportRow {
    #[tabled(rename = "Event")]
    event_id: String,
    #[tabled(rename = "Roster +")]
    roster_added: usize,
    #[tabled(rename = "Roster -")]
    roster_removed: usize,
    #[tabled(rename = "Activities -")]
    activities_removed: usize,
    #[tabled(rename = "Organizer restored")]
    organizer_restored: bool,
}

impl From<&ReconcileReport> for ReportRow {
    fn from(report: &ReconcileReport) -> Self {
        Self {
            event_id: report.event_id.to_string(),
            roster_added: report.roster_added.len(),
            roster_removed: report.roster_removed.len(),
            activities_removed: report.activities_removed.len(),
            organizer_restored: report.organizer_restored,
        }
    }
}

/// Execute the reconcile command
pub async fn execute(
    args: &ReconcileArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let services = super::services(config).await?;
    let ctx = RequestContext::system();

    let Some(raw) = &args.event else {
        if !args.force {
            let confirm = dialoguer::Confirm::new()
                .with_prompt("Reconcile every event and rewrite drifted rosters?")
                .default(false)
                .interact()
                .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

            if !confirm {
                println!("Cancelled.");
                return Ok(());
            }
        }

        let summary = services.reconciler.reconcile_all(&ctx).await?;
        let rows: Vec<ReportRow> = summary.repaired.iter().map(ReportRow::from).collect();
        output::print_rows(&rows, &summary, format);

        for (event_id, error) in &summary.failed {
            output::print_warning(&format!("{event_id}: {error}"));
        }
        output::print_success(&format!(
            "Checked {} events, repaired {}.",
            summary.events_checked,
            summary.repaired.len()
        ));
        return Ok(());
    };

    let event_id: EventId = super::parse_id(raw, "event")?;
    let ctx = ctx.with_timeout(std::time::Duration::from_secs(
        config.membership.operation_timeout_seconds,
    ));
    let report = services.reconciler.reconcile_event(&ctx, &event_id).await?;

    if report.is_clean() {
        output::print_success("No drift found.");
    } else {
        output::print_rows(&[ReportRow::from(&report)], &report, format);
    }
    Ok(())
}
