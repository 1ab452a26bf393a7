//! Subsystem wiring and network bootstrap.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use lc_01_authority::{Authority, AuthorityConfig};
use lc_04_peer_overlay::{Peer, PeerConfig};
use lc_05_consensus::{Node, NodeConfig, NoopContractExecutor};
use lc_06_api_gateway::tracker::{download_nodes_info, get_node_info};
use shared_types::NodeInfo;
use tracing::{error, warn};

use crate::config::RuntimeConfig;
use crate::genesis;

/// One wired node process: authority table, consensus engine, HTTP facade.
pub struct NodeRuntime {
    config: RuntimeConfig,
    authority: Arc<Authority>,
    node: Node,
}

impl NodeRuntime {
    /// Wire the subsystems together. Fails only on configuration errors.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        let authority = Arc::new(
            Authority::new(AuthorityConfig {
                node_count: config.node_count,
                validators_per_shard: config.validators_per_shard,
            })
            .context("authority table")?,
        );

        let peer = Peer::new(PeerConfig {
            id: config.node_id,
            host: config.host.clone(),
            port: config.port,
            interchange_port: config.interchange_port,
            seeds: Vec::new(),
            is_seed: config.is_seed,
            channel_limit: config.channel_limit,
        });

        let node = Node::new(
            NodeConfig {
                secret: config.secret(),
                block_time: config.block_time,
                block_size: config.block_size,
            },
            authority.clone(),
            peer,
            Arc::new(NoopContractExecutor),
        )
        .context("consensus engine")?;

        genesis::allocate(&node, &authority);

        Ok(Self {
            config,
            authority,
            node,
        })
    }

    /// Start every service, then bootstrap connectivity from the tracker.
    pub async fn start(&self) -> Result<()> {
        self.node.start().await.context("node startup")?;

        let facade_addr = format!("{}:{}", self.config.host, self.config.http_port);
        let facade_node = Arc::new(self.node.clone());
        tokio::spawn(async move {
            if let Err(error) = lc_06_api_gateway::serve(&facade_addr, facade_node).await {
                error!(%error, "http facade stopped");
            }
        });

        let nodes = download_nodes_info(&self.config.tracker_url)
            .await
            .context("tracker download")?;

        self.connect_to_leader(&nodes).await;
        if self.node.is_leader() {
            self.connect_to_interchanges(&nodes);
        }

        Ok(())
    }

    /// Non-leaders dial their shard leader; the leader just listens.
    async fn connect_to_leader(&self, nodes: &[NodeInfo]) {
        let chain = self.node.chain();
        let leader_id = match self.authority.leader_of(chain) {
            Ok(leader_id) => leader_id,
            Err(error) => {
                warn!(%error, "no leader to dial");
                return;
            }
        };
        if leader_id == self.config.node_id {
            return;
        }

        let Some(leader) = get_node_info(nodes, leader_id) else {
            warn!(leader = leader_id, "leader missing from the address book");
            return;
        };
        if let Err(error) = self.node.peer().connect(&leader.host, leader.port).await {
            warn!(leader = leader_id, %error, "failed to dial the shard leader");
        }
    }

    /// Leaders open one interchange link to every other chain's leader,
    /// waiting for the remote facade to answer before dialing.
    fn connect_to_interchanges(&self, nodes: &[NodeInfo]) {
        for chain in self.authority.chains() {
            let leader_id = match self.authority.leader_of(chain) {
                Ok(leader_id) => leader_id,
                Err(_) => continue,
            };
            if leader_id == self.config.node_id {
                continue;
            }
            let Some(remote) = get_node_info(nodes, leader_id) else {
                warn!(leader = leader_id, "leader missing from the address book");
                continue;
            };

            let peer = self.node.peer().clone();
            let chain = chain.clone();
            let remote = remote.clone();
            tokio::spawn(async move {
                let status_url = format!("http://{}:{}/status", remote.host, remote.http_port);
                if let Err(error) = wait_for_service(&status_url, Duration::from_secs(60)).await {
                    warn!(%chain, %error, "interchange peer never came up");
                    return;
                }
                if let Err(error) = peer
                    .connect_channel_peer(&chain, &remote.host, remote.interchange_port)
                    .await
                {
                    warn!(%chain, %error, "failed to open interchange link");
                }
            });
        }
    }
}

/// Poll a liveness URL until it answers 200 or the timeout elapses.
async fn wait_for_service(url: &str, timeout: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match reqwest::get(url).await {
            Ok(response) if response.status().is_success() => return Ok(()),
            _ if tokio::time::Instant::now() >= deadline => {
                anyhow::bail!("service at {url} did not come up in time")
            }
            _ => tokio::time::sleep(Duration::from_millis(500)).await,
        }
    }
}
