//! `bounty-node`: runs the bounty governance service over HTTP.

use anyhow::{Context, Result};
use node_runtime::container::NodeConfig;
use node_runtime::NodeRuntime;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` filter (default `info`), JSON lines when `BG_LOG_JSON=1`.
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("BG_LOG_JSON")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = NodeConfig::load().context("Failed to load configuration")?;

    let mut runtime = NodeRuntime::new(config)?;
    runtime.start().await?;

    info!("Node is running. Press Ctrl+C to stop.");
    let served = runtime.serve(shutdown_signal()).await;

    runtime.shutdown().await;
    served
}
