//! Outbound port: the acceptance hook.

use shared_types::Block;

/// Business-rule gate invoked on every append attempt.
///
/// The node engine injects its ledger-applying implementation at
/// construction; returning false refuses the append and must leave no
/// partial effects behind. The hook runs exactly once per accepted block.
pub trait BlockAcceptance: Send + Sync {
    /// Apply the block's effects, or reject it.
    fn accept(&self, block: &Block) -> bool;
}
