//! Deployment stats monitor.
//!
//! Every five seconds, fetches `/stats` from each chain leader's HTTP
//! facade and prints the documents. Point it at a running deployment's
//! tracker:
//!
//! ```text
//! LC_TRACKER_URL=http://127.0.0.1:6000 monitor-stats
//! ```

use std::time::Duration;

use anyhow::{Context, Result};
use lc_01_authority::{Authority, AuthorityConfig};
use lc_06_api_gateway::tracker::{download_nodes_info, get_node_info};
use tracing::warn;
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
    let client = reqwest::Client::new();

    loop {
        tokio::time::sleep(Duration::from_secs(5)).await;
        println!("{}", "=".repeat(40));

        let nodes = match download_nodes_info(&tracker_url).await {
            Ok(nodes) => nodes,
            Err(error) => {
                warn!(%error, "tracker download failed");
                continue;
            }
        };

        for chain in authority.chains() {
            let Ok(leader_id) = authority.leader_of(chain) else {
                continue;
            };
            let Some(leader) = get_node_info(&nodes, leader_id) else {
                warn!(leader = leader_id, "leader missing from the address book");
                continue;
            };

            let url = format!("http://{}:{}/stats", leader.host, leader.http_port);
            match client.get(&url).send().await {
                Ok(response) => match response.json::<serde_json::Value>().await {
                    Ok(stats) => println!("{stats:#}"),
                    Err(error) => warn!(%url, %error, "unreadable stats"),
                },
                Err(error) => warn!(%url, %error, "stats fetch failed"),
            }
        }
    }
}
