//! # Shared Types Crate
//!
//! Domain entities and wire message types shared by every Lattice-Chain
//! subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every cross-subsystem type lives here.
//! - **Hashes are recomputed, never trusted**: any hash or signature that
//!   arrives over the wire is advisory until the receiving side has re-derived
//!   it from the enclosed fields.
//! - **Explicit payload variants**: the transaction payload is a closed sum
//!   type; every consumption site matches it exhaustively so a new variant
//!   cannot be silently ignored.

pub mod entities;
pub mod errors;
pub mod message;

pub use entities::*;
pub use errors::WireError;
pub use message::{GreetingData, Message, MessageType, PeerRecord, PeersData};
