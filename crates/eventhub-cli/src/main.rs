//! EventHub CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::Cli;

#[tokio::main]
async fn main() {
    // Logs go to stderr so table/JSON output on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.execute().await {
        eprintln!("Error: {e}");
        if let Some(reason) = e.reason {
            eprintln!("Reason: {}", reason.code());
        }
        std::process::exit(1);
    }
}
