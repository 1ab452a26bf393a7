//! # LC-05 Consensus
//!
//! The node engine: block production, voting, commit, and cross-shard
//! settlement for one shard participant.
//!
//! ## Protocol
//!
//! Within a shard, the authority-designated leader proposes; validators
//! validate and vote; the leader tallies. A proposal commits on unanimous
//! signatures, or on more than two thirds once the proposal has outlived the
//! block interval. The quorum condition is re-evaluated both on every vote
//! arrival and on every production-timer tick, so a supermajority reached at
//! the deadline cannot stall.
//!
//! ## Ledger application
//!
//! A committed block's effects run exactly once per node, inside the block
//! store's acceptance gate: in-shard transfers settle locally; transfers
//! routed elsewhere debit locally and emit a receipt toward the destination
//! shard over the leader's interchange link; receipts credit their
//! destination; shard commits are only acceptable on basechain. A payload
//! that fails rejects the whole block and leaves the ledger untouched.
//!
//! ## Module Structure
//!
//! ```text
//! lc-05-consensus/
//! ├── domain/          # pending pool, stats document
//! ├── ports.rs         # contract execution seam
//! ├── validation.rs    # intake/proposal/quorum rules
//! ├── applier.rs       # the ledger-applying acceptance hook
//! └── service.rs       # the Node state machine
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;

mod applier;
mod errors;
mod service;
mod validation;

pub use domain::{NodeStats, PendingPool};
pub use errors::ConsensusError;
pub use ports::{ContractExecutor, NoopContractExecutor};
pub use service::{Node, NodeConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
