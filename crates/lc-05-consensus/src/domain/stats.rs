//! The stats document served by the HTTP facade.

use serde::Serialize;
use shared_types::{ChainId, Hash};

/// A point-in-time summary of one node's chain and pool.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStats {
    /// The chain this node validates.
    pub chain: ChainId,
    /// Tip height (0 = genesis only).
    pub block_height: u64,
    /// Tip hash.
    pub block_hash: Hash,
    /// Transactions in the tip block.
    pub block_tx_number: usize,
    /// Transactions committed across all blocks.
    pub total_tx_number: usize,
    /// Mean transactions per committed block (genesis excluded).
    pub avg_tx_number: f64,
    /// Transactions currently pending.
    pub pending_tx_number: usize,
}
