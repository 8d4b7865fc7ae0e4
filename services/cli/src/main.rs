use anyhow::Result;
use clap::Parser;
use tracing::info;

mod commands;
mod render;
mod state;

use common::{ClientConfig, telemetry};

use crate::{commands::Command, state::AppState};

/// Command-line client for the Taskbook service
#[derive(Parser)]
#[command(name = "taskbook")]
#[command(about = "Manage Taskbook tasks from the terminal", long_about = None)]
#[command(version)]
struct Cli {
    /// Service base URL, overriding configuration
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = ClientConfig::load()?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
        config.validate()?;
    }

    // Initialize logging
    telemetry::init(&config.log_filter);
    info!("Using task service at {}", config.base_url);

    let state = AppState::init(config).await?;
    commands::run(cli.command, &state).await
}
