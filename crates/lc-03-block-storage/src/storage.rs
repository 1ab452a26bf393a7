//! The append-only chain store.

use std::collections::HashSet;
use std::sync::Arc;

use shared_types::{Block, Hash};
use tracing::debug;

use crate::ports::BlockAcceptance;

/// One node's view of its chain, plus a hash index over committed txs.
pub struct BlockStorage {
    blocks: Vec<Block>,
    committed_txs: HashSet<Hash>,
    handler: Arc<dyn BlockAcceptance>,
}

impl BlockStorage {
    /// An empty store with its acceptance hook.
    pub fn new(handler: Arc<dyn BlockAcceptance>) -> Self {
        Self {
            blocks: Vec::new(),
            committed_txs: HashSet::new(),
            handler,
        }
    }

    /// Try to append a block.
    ///
    /// Accepted iff it links onto the current tip (the store being empty
    /// requires the genesis shape) and the acceptance hook approves it.
    pub fn add(&mut self, block: Block) -> bool {
        let links = match self.blocks.last() {
            None => block.is_genesis(),
            Some(tip) => {
                tip.hash == block.header.parent_block_hash
                    && block.header.height == tip.header.height + 1
            }
        };
        if !links {
            debug!(
                height = block.header.height,
                hash = %block.hash,
                "block does not extend the tip, refused"
            );
            return false;
        }

        if !self.handler.accept(&block) {
            return false;
        }

        for tx in &block.body.txs {
            self.committed_txs.insert(tx.hash.clone());
        }
        self.blocks.push(block);

        true
    }

    /// Look a committed block up by hash.
    pub fn get_by_hash(&self, hash: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.hash == hash)
    }

    /// The current tip.
    pub fn last(&self) -> Option<&Block> {
        self.blocks.last()
    }

    /// Whether a transaction was committed in any block.
    pub fn contains_tx(&self, hash: &str) -> bool {
        self.committed_txs.contains(hash)
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the store holds no blocks yet.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Iterate over the chain from genesis to tip.
    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BlockBody, BlockHeader};

    struct AcceptAll;
    impl BlockAcceptance for AcceptAll {
        fn accept(&self, _block: &Block) -> bool {
            true
        }
    }

    struct RejectAll;
    impl BlockAcceptance for RejectAll {
        fn accept(&self, _block: &Block) -> bool {
            false
        }
    }

    fn child_of(parent: &Block) -> Block {
        Block::new(
            BlockHeader {
                chain: parent.header.chain.clone(),
                timestamp: parent.header.timestamp + 1,
                height: parent.header.height + 1,
                parent_block_hash: parent.hash.clone(),
            },
            BlockBody { txs: Vec::new() },
        )
    }

    #[test]
    fn test_empty_store_accepts_only_genesis() {
        let mut storage = BlockStorage::new(Arc::new(AcceptAll));
        let genesis = Block::genesis("shard_1");
        let stray = child_of(&genesis);

        assert!(!storage.add(stray));
        assert!(storage.add(genesis.clone()));
        assert_eq!(storage.last().map(|b| b.hash.clone()), Some(genesis.hash));
    }

    #[test]
    fn test_append_requires_tip_linkage() {
        let mut storage = BlockStorage::new(Arc::new(AcceptAll));
        let genesis = Block::genesis("shard_1");
        let child = child_of(&genesis);
        let grandchild = child_of(&child);

        assert!(storage.add(genesis));
        assert!(!storage.add(grandchild.clone()));
        assert!(storage.add(child));
        assert!(storage.add(grandchild));
        assert_eq!(storage.len(), 3);

        // Heights stay contiguous from genesis.
        for (i, block) in storage.iter().enumerate() {
            assert_eq!(block.header.height, i as u64);
        }
    }

    #[test]
    fn test_height_discontinuity_refused() {
        let mut storage = BlockStorage::new(Arc::new(AcceptAll));
        let genesis = Block::genesis("shard_1");
        let mut skipper = child_of(&genesis);
        skipper.header.height = 5;
        skipper.update_hash();

        assert!(storage.add(genesis));
        assert!(!storage.add(skipper));
    }

    #[test]
    fn test_acceptance_hook_gates_append() {
        let mut storage = BlockStorage::new(Arc::new(RejectAll));
        assert!(!storage.add(Block::genesis("shard_1")));
        assert!(storage.is_empty());
    }

    #[test]
    fn test_lookup_by_hash_and_tx_index() {
        let mut storage = BlockStorage::new(Arc::new(AcceptAll));
        let genesis = Block::genesis("shard_1");
        let mut child = child_of(&genesis);

        let mut transfer = shared_types::ValueTransfer {
            from: "alice".to_string(),
            to: "bob".to_string(),
            amount: "1".to_string(),
            signature: String::new(),
        };
        transfer.sign("alice");
        let tx = shared_types::Tx::new(shared_types::TxPayload::ValueTransfer(transfer));
        child.body.txs.push(tx.clone());
        child.update_hash();

        assert!(storage.add(genesis.clone()));
        assert!(storage.add(child.clone()));

        assert!(storage.get_by_hash(&child.hash).is_some());
        assert!(storage.get_by_hash(&"ff".repeat(32)).is_none());
        assert!(storage.contains_tx(&tx.hash));
        assert!(!storage.contains_tx(&"00".repeat(32)));
    }
}
