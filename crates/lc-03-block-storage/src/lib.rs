//! # LC-03 Block Storage
//!
//! Append-only chain of committed blocks.
//!
//! ## Purpose
//!
//! Holds one chain per node process. An append is accepted only when the
//! block extends the current tip (parent hash and height both line up) AND
//! the injected [`BlockAcceptance`] hook approves it, so chain linkage and
//! business-rule acceptance act as one atomic gate.
//!
//! ## No fork choice
//!
//! There is no removal and no reorganization: a block that does not extend
//! the tip is refused outright. Concurrent proposals from a partitioned or
//! misbehaving leader are dropped, not reconciled.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod ports;
mod storage;

pub use ports::BlockAcceptance;
pub use storage::BlockStorage;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
