//! Runs the agent-to-agent hub over HTTP.
//!
//! Usage:
//!
//! ```text
//! switchboard [--config <path>] [--bind <addr>]
//! ```
//!
//! Without `--config` every setting takes its default. `--bind` overrides
//! the configured `bind_address`. Set `RUST_LOG` to change log verbosity.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use switchboard::{
    config::HubConfig,
    hub::{Hub, HubError},
    telemetry,
};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "switchboard", version, about = "Agent-to-agent communication hub")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, env = "SWITCHBOARD_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configuration file.
    #[arg(long, env = "SWITCHBOARD_BIND")]
    bind: Option<SocketAddr>,
}

impl Cli {
    fn into_config(self) -> Result<HubConfig, HubError> {
        let mut config = match self.config {
            Some(path) => HubConfig::load(&path)?,
            None => HubConfig::default(),
        };
        if let Some(address) = self.bind {
            config.bind_address = address;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = Cli::parse().into_config()?;
    telemetry::init(config.log_format)?;

    let hub = Hub::build(config)?;
    hub.serve(shutdown_signal()).await?;
    tracing::info!("switchboard stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
