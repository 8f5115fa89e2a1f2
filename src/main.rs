mod config;
mod executor;
mod filter;
mod resource;
mod security;
mod server;

use clap::Parser;
use rmcp::{transport::stdio, ServiceExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Cli, ServerConfig};
use security::ShellPolicy;
use server::TerminalServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // stdout carries the MCP protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_filter)?)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let config = ServerConfig::try_from(&cli)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        timeout_secs = config.execution.timeout.as_secs(),
        readme = %config.readme_path.display(),
        "Starting MCP Terminal Server"
    );
    if config.policy == ShellPolicy::Unrestricted {
        warn!("Unrestricted shell enabled: clients can run arbitrary shell code");
    }

    let service = TerminalServer::new(config).serve(stdio()).await?;
    service.waiting().await?;

    info!("MCP Terminal Server shutting down");
    Ok(())
}
