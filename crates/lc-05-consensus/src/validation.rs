//! Stateless intake, proposal, and quorum rules.
//!
//! Every rule re-derives from first principles (hash, signature, balance)
//! because messages arrive over arbitrary connection interleavings; arrival
//! order proves nothing.

use std::collections::HashSet;

use lc_02_ledger::AccountLedger;
use shared_types::{Block, Tx, TxPayload, BASECHAIN};

/// Check one transaction against a chain's intake rules.
///
/// - hash must re-derive (a claimed hash is never trusted)
/// - value transfers and contract payloads must carry a valid sender
///   signature; transfers must also clear the sender's current balance
/// - receipts are admitted unconditionally (their trust is established by
///   the enclosing chain's consensus, keeping intake cheap)
/// - shard commits are only admissible on basechain, with unanimously valid
///   signatures
pub(crate) fn admit_transaction(
    tx: &Tx,
    chain: &str,
    accounts: &AccountLedger,
) -> Result<(), &'static str> {
    if !tx.verify_hash() {
        return Err("hash mismatch");
    }

    match &tx.data {
        TxPayload::ValueTransfer(transfer) => {
            if !transfer.verify_signature(&transfer.from) {
                return Err("bad transfer signature");
            }
            let amount = transfer.amount().ok_or("malformed amount")?;
            if !accounts.check_transaction(&transfer.from, amount) {
                return Err("insufficient balance");
            }
            Ok(())
        }
        TxPayload::Receipt(receipt) => {
            receipt.amount().ok_or("malformed amount")?;
            Ok(())
        }
        TxPayload::ShardCommit(commit) => {
            if chain != BASECHAIN {
                return Err("shard commit outside basechain");
            }
            if !commit.verify_signatures() {
                return Err("bad shard commit signatures");
            }
            Ok(())
        }
        TxPayload::SetContract(contract) => {
            if !contract.verify_signature(&contract.from) {
                return Err("bad contract signature");
            }
            Ok(())
        }
        TxPayload::ExecuteContract(call) => {
            if !call.verify_signature(&call.from) {
                return Err("bad contract signature");
            }
            Ok(())
        }
    }
}

/// Validate a block proposal before voting on it.
pub(crate) fn validate_proposal(
    block: &Block,
    chain: &str,
    block_size: usize,
    accounts: &AccountLedger,
) -> Result<(), &'static str> {
    if block.header.chain != chain {
        return Err("wrong chain tag");
    }
    if !block.verify_hash() {
        return Err("hash mismatch");
    }
    if block.body.txs.len() > block_size {
        return Err("body exceeds block size");
    }
    for tx in &block.body.txs {
        admit_transaction(tx, chain, accounts)?;
    }
    Ok(())
}

/// The commit condition.
///
/// Unanimity is the fast path; after the proposal outlives the block
/// interval, a strict two-thirds supermajority suffices.
pub(crate) fn quorum_reached(signatures: usize, validators: usize, timed_out: bool) -> bool {
    signatures == validators || (timed_out && 3 * signatures > 2 * validators)
}

/// Check a finalized block's signature set: every signature distinct and
/// valid against the block hash, in supermajority strength.
pub(crate) fn verify_committed_signatures(block: &Block, validators: usize) -> bool {
    let mut seen = HashSet::new();
    let valid = block
        .signatures
        .iter()
        .filter(|sig| seen.insert(sig.signature.as_str()) && block.validate_signature(sig))
        .count();

    valid == validators || 3 * valid > 2 * validators
}
