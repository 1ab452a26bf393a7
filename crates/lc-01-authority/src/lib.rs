//! # LC-01 Authority
//!
//! Deterministic sharding and leader election.
//!
//! ## Purpose
//!
//! One immutable table, computed once at startup from
//! `{node_count, validators_per_shard}`, answers every
//! "who is responsible for what" question in the network:
//!
//! - which chain a node validates ([`Authority::chain_of`])
//! - the ordered validator committee of a chain ([`Authority::validators_of`])
//! - the chain's leader, always the first committee member
//!   ([`Authority::leader_of`])
//! - which shard an account address settles on ([`Authority::shard_of`])
//!
//! ## Determinism
//!
//! All assignments are pure functions of the global configuration, so every
//! node derives the same table without coordination. Address routing hashes
//! the address with SHA-256 and reduces the digest modulo the shard count;
//! this is the routing oracle used both by ledger settlement and by
//! interchange-channel setup, and the two must never disagree.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod authority;
mod errors;

pub use authority::{Authority, AuthorityConfig};
pub use errors::AuthorityError;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
