//! `binwatch-server` binary: serve the API or run maintenance tasks.

use anyhow::{Context, Result};
use binwatch_server::config::Config;
use binwatch_server::state::AppState;
use binwatch_server::{init_tracing, start_server};
use clap::{Parser, Subcommand};
use tracing::info;

#[derive(Parser)]
#[command(version, about = "Waste bin monitoring API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API (default).
    Serve,
    /// Hand out residents without an authority to the existing authorities.
    AssignResidents {
        /// Maximum number of residents each authority receives in this run.
        #[arg(long, default_value_t = 5)]
        per_authority: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = Config::load().context("Environment misconfigured")?;
    let state = AppState::from_config(&config).context("Failed to initialize state")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            info!("Starting server...");
            start_server(state, config.port)
                .await
                .context("Server failed")?;
        }
        Command::AssignResidents { per_authority } => {
            let assigned = state
                .service
                .assign_unclaimed_residents(per_authority)
                .await
                .context("Assignment failed")?;
            for (resident, authority) in &assigned {
                info!(%resident, %authority, "assigned resident");
            }
            info!(count = assigned.len(), "assignment finished");
        }
    }
    Ok(())
}
