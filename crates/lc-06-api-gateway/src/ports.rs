//! Inbound port: what the gateway needs from a node.

use lc_05_consensus::{ConsensusError, Node, NodeStats};
use shared_types::Tx;

/// The node operations the HTTP surface is allowed to reach.
///
/// Exactly two: read the stats document, and inject a transaction through
/// the same intake path gossip uses.
pub trait NodeApi: Send + Sync {
    /// Point-in-time chain/pool summary.
    fn stats(&self) -> NodeStats;

    /// Inject a client-submitted transaction.
    fn submit_tx(&self, tx: Tx) -> Result<(), ConsensusError>;
}

impl NodeApi for Node {
    fn stats(&self) -> NodeStats {
        Node::stats(self)
    }

    fn submit_tx(&self, tx: Tx) -> Result<(), ConsensusError> {
        Node::submit_tx(self, tx)
    }
}
