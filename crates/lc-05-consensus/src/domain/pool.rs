//! The pending-transaction pool.

use std::collections::HashMap;

use shared_types::{Hash, Tx};

/// Validated, not-yet-committed transactions, deduplicated by hash.
///
/// Arrival order is preserved: block proposals fill greedily from the front.
#[derive(Debug, Default)]
pub struct PendingPool {
    txs: HashMap<Hash, Tx>,
    order: Vec<Hash>,
}

impl PendingPool {
    /// An empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transaction hash is pending.
    pub fn contains(&self, hash: &str) -> bool {
        self.txs.contains_key(hash)
    }

    /// Add a transaction. Returns false on a duplicate hash.
    pub fn insert(&mut self, tx: Tx) -> bool {
        if self.txs.contains_key(&tx.hash) {
            return false;
        }
        self.order.push(tx.hash.clone());
        self.txs.insert(tx.hash.clone(), tx);
        true
    }

    /// Drop a set of committed transactions.
    pub fn remove_many(&mut self, hashes: &[Hash]) {
        for hash in hashes {
            self.txs.remove(hash);
        }
        self.order.retain(|hash| self.txs.contains_key(hash));
    }

    /// Greedily select up to `max` admissible transactions in arrival order.
    ///
    /// Skipped transactions stay pending; they may become admissible later.
    pub fn select(&self, max: usize, mut admissible: impl FnMut(&Tx) -> bool) -> Vec<Tx> {
        let mut selected = Vec::new();
        for hash in &self.order {
            if selected.len() == max {
                break;
            }
            if let Some(tx) = self.txs.get(hash) {
                if admissible(tx) {
                    selected.push(tx.clone());
                }
            }
        }
        selected
    }

    /// Number of pending transactions.
    pub fn len(&self) -> usize {
        self.txs.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.txs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{TxPayload, ValueTransfer};

    fn tx(from: &str, amount: &str) -> Tx {
        let mut transfer = ValueTransfer {
            from: from.to_string(),
            to: "bob".to_string(),
            amount: amount.to_string(),
            signature: String::new(),
        };
        transfer.sign(from);
        Tx::new(TxPayload::ValueTransfer(transfer))
    }

    #[test]
    fn test_insert_dedups_by_hash() {
        let mut pool = PendingPool::new();
        let first = tx("alice", "1");

        assert!(pool.insert(first.clone()));
        assert!(!pool.insert(first.clone()));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&first.hash));
    }

    #[test]
    fn test_select_preserves_arrival_order_and_cap() {
        let mut pool = PendingPool::new();
        let txs: Vec<Tx> = (1..=4).map(|i| tx("alice", &i.to_string())).collect();
        for tx in &txs {
            pool.insert(tx.clone());
        }

        let selected = pool.select(3, |_| true);
        assert_eq!(selected.len(), 3);
        assert_eq!(selected[0].hash, txs[0].hash);
        assert_eq!(selected[2].hash, txs[2].hash);
    }

    #[test]
    fn test_select_skips_inadmissible() {
        let mut pool = PendingPool::new();
        let keep = tx("alice", "1");
        let skip = tx("mallory", "2");
        pool.insert(skip.clone());
        pool.insert(keep.clone());

        let selected = pool.select(10, |tx| tx.hash == keep.hash);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].hash, keep.hash);
        // The skipped transaction stays pending.
        assert!(pool.contains(&skip.hash));
    }

    #[test]
    fn test_remove_many() {
        let mut pool = PendingPool::new();
        let committed = tx("alice", "1");
        let waiting = tx("alice", "2");
        pool.insert(committed.clone());
        pool.insert(waiting.clone());

        pool.remove_many(&[committed.hash.clone()]);
        assert!(!pool.contains(&committed.hash));
        assert!(pool.contains(&waiting.hash));
        assert_eq!(pool.select(10, |_| true).len(), 1);
    }
}
