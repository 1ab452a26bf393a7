//! Cluster-building helpers shared by the integration scenarios.

use std::sync::Arc;
use std::time::Duration;

use lc_01_authority::{Authority, AuthorityConfig};
use lc_04_peer_overlay::{Peer, PeerConfig};
use lc_05_consensus::{Node, NodeConfig, NoopContractExecutor};
use shared_types::{Address, NodeId, Tx, TxPayload, ValueTransfer};

/// A started cluster: one [`Node`] per id, fully connected the way the
/// runtime bootstraps them.
pub struct TestCluster {
    /// Nodes indexed by id.
    pub nodes: Vec<Node>,
    /// The shared authority table.
    pub authority: Arc<Authority>,
}

impl TestCluster {
    /// The nodes validating one chain.
    pub fn on_chain(&self, chain: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| node.chain() == chain)
            .collect()
    }

    /// The leader of a chain.
    pub fn leader_of(&self, chain: &str) -> &Node {
        let leader_id = self.authority.leader_of(chain).unwrap();
        self.nodes
            .iter()
            .find(|node| node.peer().id() == leader_id)
            .unwrap()
    }
}

fn gossip_port(base_port: u16, id: NodeId) -> u16 {
    base_port + id as u16
}

fn interchange_port(base_port: u16, id: NodeId) -> u16 {
    base_port + 50 + id as u16
}

/// Build and start a cluster of `node_count` nodes on consecutive ports
/// above `base_port`, then bootstrap connectivity: every non-leader dials
/// its shard leader, and every leader opens interchange links to every
/// other chain's leader.
pub async fn start_cluster(
    node_count: u64,
    validators_per_shard: u64,
    base_port: u16,
    block_time: Duration,
) -> TestCluster {
    let all: Vec<NodeId> = (0..node_count).collect();
    start_cluster_subset(node_count, validators_per_shard, base_port, block_time, &all).await
}

/// Like [`start_cluster`], but only the listed node ids are actually
/// started; the rest of the committee stays dark (for quorum scenarios).
pub async fn start_cluster_subset(
    node_count: u64,
    validators_per_shard: u64,
    base_port: u16,
    block_time: Duration,
    live: &[NodeId],
) -> TestCluster {
    let authority = Arc::new(
        Authority::new(AuthorityConfig {
            node_count,
            validators_per_shard,
        })
        .unwrap(),
    );

    let mut nodes = Vec::new();
    for &id in live {
        let peer = Peer::new(PeerConfig {
            id,
            host: "127.0.0.1".to_string(),
            port: gossip_port(base_port, id),
            interchange_port: interchange_port(base_port, id),
            seeds: Vec::new(),
            is_seed: false,
            channel_limit: 10,
        });
        let node = Node::new(
            NodeConfig {
                secret: format!("node_{id}"),
                block_time,
                block_size: 100,
            },
            authority.clone(),
            peer,
            Arc::new(NoopContractExecutor),
        )
        .unwrap();
        node.start().await.unwrap();
        nodes.push(node);
    }

    // Every listener is up; dial the shard leaders.
    for node in &nodes {
        let leader_id = authority.leader_of(node.chain()).unwrap();
        if leader_id != node.peer().id() {
            node.peer()
                .connect("127.0.0.1", gossip_port(base_port, leader_id))
                .await
                .unwrap();
        }
    }

    // Leaders open the interchange mesh.
    for node in &nodes {
        if !node.is_leader() {
            continue;
        }
        for chain in authority.chains() {
            let leader_id = authority.leader_of(chain).unwrap();
            if leader_id == node.peer().id() {
                continue;
            }
            node.peer()
                .connect_channel_peer(
                    chain,
                    "127.0.0.1",
                    interchange_port(base_port, leader_id),
                )
                .await
                .unwrap();
        }
    }

    TestCluster { nodes, authority }
}

/// A signed value transfer wrapped in its transaction envelope.
pub fn signed_transfer(from: &str, to: &str, amount: &str) -> Tx {
    let mut transfer = ValueTransfer {
        from: from.to_string(),
        to: to.to_string(),
        amount: amount.to_string(),
        signature: String::new(),
    };
    transfer.sign(from);
    Tx::new(TxPayload::ValueTransfer(transfer))
}

/// Distinct addresses routing to one chain under the given authority.
pub fn addresses_on(authority: &Authority, chain: &str, count: usize) -> Vec<Address> {
    let mut found = Vec::new();
    for i in 0..100_000u32 {
        let address = format!("test-account-{i}");
        if authority.shard_of(&address) == chain {
            found.push(address);
            if found.len() == count {
                return found;
            }
        }
    }
    panic!("not enough addresses routing to {chain}");
}

/// Poll a condition for up to ten seconds.
pub async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
