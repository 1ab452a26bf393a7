//! # Lattice-Chain Node Runtime
//!
//! The main entry point for one shard participant.
//!
//! ## Startup Sequence
//!
//! 1. Initialize tracing (`LC_LOG_LEVEL`, default `info`)
//! 2. Load configuration from the environment (missing required variables
//!    are the only process-fatal failure class)
//! 3. Compute the authority table and wire the node onto its overlay
//! 4. Allocate the demo faucet balances for this node's shard
//! 5. Start the overlay, block production, and the HTTP facade
//! 6. Fetch the address book from the tracker, dial the shard leader, and
//!    (for leaders) open the interchange mesh
//! 7. Run until ctrl-c

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use node_runtime::config::RuntimeConfig;
use node_runtime::runtime::NodeRuntime;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = std::env::var("LC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let config = RuntimeConfig::from_env().context("configuration error")?;
    info!(id = config.node_id, "starting Lattice-Chain node");

    let runtime = NodeRuntime::new(config).context("failed to wire the node")?;
    runtime.start().await.context("failed to start the node")?;
    info!("ready");

    tokio::signal::ctrl_c()
        .await
        .context("failed to wait for shutdown signal")?;
    info!("shutting down");
    Ok(())
}
