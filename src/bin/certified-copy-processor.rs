//! # Certified Copy Processor
//!
//! Runs the consumer group until interrupted. Exits with status 1 when a
//! required environment variable is missing.

use std::process;

use anyhow::Context;
use certified_copy_processor::bootstrap::ProcessorSystem;
use certified_copy_processor::config::ConfigManager;
use certified_copy_processor::logging::init_structured_logging;
use clap::Parser;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "certified-copy-processor")]
#[command(about = "Turn certified copy orders into sign digital document requests")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Load and validate configuration, print it, and exit
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_structured_logging();

    let config_manager = match ConfigManager::from_env() {
        Ok(manager) => manager,
        Err(e) => {
            error!(error = %e, "Configuration invalid, refusing to start");
            process::exit(1);
        }
    };

    if cli.check_config {
        println!(
            "{}",
            serde_json::to_string_pretty(&config_manager.debug_config())
                .context("rendering configuration")?
        );
        return Ok(());
    }

    let system = ProcessorSystem::bootstrap(&config_manager)
        .context("bootstrapping certified copy processor")?;
    system.start().context("starting chain consumer")?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown signal received");

    system.stop().await;
    info!(status = ?system.status(), "Exiting");
    Ok(())
}
