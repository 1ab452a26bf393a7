//! # LC-02 Ledger
//!
//! Per-shard account balances.
//!
//! ## Purpose
//!
//! An in-memory balance store with transactional mutation. Accounts are
//! created lazily on first reference and live for the process lifetime; a
//! balance can never go negative because every debit is gated by
//! [`AccountLedger::check_transaction`].
//!
//! ## Cross-shard settlement boundary
//!
//! [`AccountLedger::transact`] is the full local transfer.
//! [`AccountLedger::transact_outer`] is the debit-only half used when the
//! recipient settles on another shard: the matching credit happens there,
//! asynchronously, once that shard commits the corresponding receipt. The
//! window between debit and credit is bounded by gossip plus consensus
//! latency, not by any protocol guarantee.
//!
//! ## Ownership
//!
//! The ledger has a single owner (the node engine) which serializes all
//! mutation behind its own lock; the store itself is a plain data structure.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ledger;

pub use ledger::AccountLedger;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
