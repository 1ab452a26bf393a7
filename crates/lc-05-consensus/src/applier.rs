//! The ledger-applying acceptance hook.

use std::sync::Arc;

use lc_01_authority::Authority;
use lc_02_ledger::AccountLedger;
use lc_03_block_storage::BlockAcceptance;
use parking_lot::Mutex;
use shared_types::{Block, ChainId, Receipt, Tx, TxPayload, BASECHAIN};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::ports::ContractExecutor;

/// Applies a block's effects to the account ledger, exactly once per
/// accepted block, inside the store's append gate.
///
/// Effects run against a working copy of the ledger; a failing payload
/// rejects the whole block and publishes nothing, so a refused append leaves
/// no partial state behind. Receipts for cross-shard transfers are queued on
/// the outbound mailbox only after the copy is committed back.
pub(crate) struct LedgerApplier {
    chain: ChainId,
    authority: Arc<Authority>,
    accounts: Arc<Mutex<AccountLedger>>,
    outbound: mpsc::UnboundedSender<(ChainId, Tx)>,
    executor: Arc<dyn ContractExecutor>,
}

impl LedgerApplier {
    pub(crate) fn new(
        chain: ChainId,
        authority: Arc<Authority>,
        accounts: Arc<Mutex<AccountLedger>>,
        outbound: mpsc::UnboundedSender<(ChainId, Tx)>,
        executor: Arc<dyn ContractExecutor>,
    ) -> Self {
        Self {
            chain,
            authority,
            accounts,
            outbound,
            executor,
        }
    }
}

impl BlockAcceptance for LedgerApplier {
    fn accept(&self, block: &Block) -> bool {
        let mut working = self.accounts.lock().clone();
        let mut receipts: Vec<(ChainId, Tx)> = Vec::new();

        for tx in &block.body.txs {
            match &tx.data {
                TxPayload::ValueTransfer(transfer) => {
                    let Some(amount) = transfer.amount() else {
                        warn!(tx = %tx.hash, "malformed transfer amount, block refused");
                        return false;
                    };
                    let destination = self.authority.shard_of(&transfer.to);

                    if destination == self.chain {
                        if !working.transact(&transfer.from, &transfer.to, amount) {
                            warn!(tx = %tx.hash, "transfer failed, block refused");
                            return false;
                        }
                    } else {
                        if !working.transact_outer(&transfer.from, amount) {
                            warn!(tx = %tx.hash, "outer transfer failed, block refused");
                            return false;
                        }
                        let receipt = Receipt {
                            block_hash: block.hash.clone(),
                            original_tx_hash: tx.hash.clone(),
                            to: transfer.to.clone(),
                            amount: transfer.amount.clone(),
                        };
                        receipts.push((destination, Tx::new(TxPayload::Receipt(receipt))));
                    }
                }
                TxPayload::Receipt(receipt) => {
                    let Some(amount) = receipt.amount() else {
                        warn!(tx = %tx.hash, "malformed receipt amount, block refused");
                        return false;
                    };
                    working.issue(&receipt.to, amount);
                }
                TxPayload::ShardCommit(commit) => {
                    // Shard finality is anchored on basechain and nowhere else.
                    if self.chain != BASECHAIN {
                        warn!(tx = %tx.hash, "shard commit outside basechain, block refused");
                        return false;
                    }
                    if !commit.verify_signatures() {
                        warn!(tx = %tx.hash, "shard commit signatures invalid, block refused");
                        return false;
                    }
                    debug!(
                        shard = %commit.chain,
                        block = %commit.block_hash,
                        "shard commit anchored"
                    );
                }
                TxPayload::SetContract(contract) => {
                    if !self.executor.set_contract(&tx.hash, contract) {
                        warn!(tx = %tx.hash, "contract installation refused, block refused");
                        return false;
                    }
                }
                TxPayload::ExecuteContract(call) => {
                    if !self.executor.execute_contract(call) {
                        warn!(tx = %tx.hash, "contract call refused, block refused");
                        return false;
                    }
                }
            }
        }

        *self.accounts.lock() = working;
        for (channel, tx) in receipts {
            // Delivery is the forwarding task's problem; a closed mailbox
            // only means the node is shutting down.
            let _ = self.outbound.send((channel, tx));
        }

        true
    }
}
