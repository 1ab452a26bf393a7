//! Demo traffic generator.
//!
//! Signs transfers of 1 between random faucet addresses and posts each one
//! to the HTTP facade of the sender's shard leader, forever. Point it at a
//! running deployment's tracker:
//!
//! ```text
//! LC_TRACKER_URL=http://127.0.0.1:6000 generate-txs
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use lc_01_authority::{Authority, AuthorityConfig};
use lc_06_api_gateway::tracker::{download_nodes_info, get_node_info};
use node_runtime::genesis::faucet_addresses;
use rand::seq::SliceRandom;
use shared_types::{Tx, TxPayload, ValueTransfer};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn env_or(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = std::env::var("LC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let tracker_url =
        std::env::var("LC_TRACKER_URL").context("LC_TRACKER_URL must be set")?;
    let authority = Authority::new(AuthorityConfig {
        node_count: env_or("LC_NODE_COUNT", 100),
        validators_per_shard: env_or("LC_VALIDATORS_PER_SHARD", 10),
    })
    .context("authority table")?;

    let nodes = download_nodes_info(&tracker_url)
        .await
        .context("tracker download")?;
    let addresses = faucet_addresses();
    let client = reqwest::Client::new();
    info!(nodes = nodes.len(), "generating traffic");

    loop {
        tokio::time::sleep(Duration::from_millis(100)).await;

        let (from, to) = {
            let mut rng = rand::thread_rng();
            match (addresses.choose(&mut rng), addresses.choose(&mut rng)) {
                (Some(from), Some(to)) => (from.clone(), to.clone()),
                _ => continue,
            }
        };

        let shard = authority.shard_of(&from);
        let leader_id = match authority.leader_of(&shard) {
            Ok(leader_id) => leader_id,
            Err(error) => {
                warn!(%shard, %error, "no leader for shard");
                continue;
            }
        };
        let Some(leader) = get_node_info(&nodes, leader_id) else {
            warn!(leader = leader_id, "leader missing from the address book");
            continue;
        };

        let mut transfer = ValueTransfer {
            from: from.clone(),
            to,
            amount: "1".to_string(),
            signature: String::new(),
        };
        transfer.sign(&from);
        let tx = Tx::new(TxPayload::ValueTransfer(transfer));

        let url = format!("http://{}:{}/txs", leader.host, leader.http_port);
        if let Err(error) = client.post(&url).json(&tx).send().await {
            warn!(%url, %error, "submit failed");
        }
    }
}
