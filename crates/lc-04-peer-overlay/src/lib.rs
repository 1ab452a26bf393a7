//! # LC-04 Peer Overlay
//!
//! The channel-partitioned gossip network.
//!
//! ## Purpose
//!
//! Maintains live TCP connections to other nodes, discovers transitively
//! reachable peers, and delivers channel-scoped messages with
//! at-most-one-delivery-per-hop semantics:
//!
//! - greeting handshake on every connection, either direction
//! - bounded per-channel peer directory (backpressure against star-topology
//!   overload from naive flooding)
//! - seed peers announce their full directory so the network self-organizes
//! - flood-fill [`Peer::broadcast`] scoped by channel, with echo suppression
//!   and a bounded per-connection duplicate window
//! - point-to-point interchange links between chain leaders on a dedicated
//!   port, never flooded
//!
//! ## Module Structure
//!
//! ```text
//! lc-04-peer-overlay/
//! ├── domain/          # RemotePeerStorage, dedup window, connection handles
//! ├── ports.rs         # MessageHandler dispatch seam
//! └── service.rs       # Peer: listeners, connections, broadcast
//! ```
//!
//! ## Failure model
//!
//! Malformed messages are logged and dropped, never fatal to a connection.
//! A failed outbound connect is logged and skipped. A closed connection
//! deregisters the peer from every channel; nothing reconnects
//! automatically, and the layers above must tolerate the absence.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod ports;
mod service;

mod errors;

pub use domain::{HostPort, PeerAddResult, RemotePeer, RemotePeerStorage};
pub use errors::OverlayError;
pub use ports::MessageHandler;
pub use service::{Peer, PeerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
