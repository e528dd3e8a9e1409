use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use github_mcp_remote::{Config, Lifecycle, ShutdownOutcome};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "github_mcp_remote=info,rmcp=warn";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "GitHub MCP server failed");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` replaces the default filter entirely when set.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<()> {
    let config = Config::parse().validate()?;
    info!(
        addr = %config.addr,
        transport = %config.binding,
        read_only = config.read_only,
        toolsets = ?config.toolsets,
        "Starting GitHub MCP server"
    );

    let lifecycle = Lifecycle::new(config.shutdown_grace);
    lifecycle.watch_signals();

    match github_mcp_remote::run(config, &lifecycle).await? {
        ShutdownOutcome::Clean => info!("Shutdown complete"),
        ShutdownOutcome::Forced => warn!("Shutdown forced after grace period"),
    }
    Ok(())
}
