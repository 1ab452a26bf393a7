//! # LC-06 API Gateway
//!
//! The node's HTTP surface, and the tracker address-book client.
//!
//! ## Endpoints
//!
//! | Route | Method | Purpose |
//! |-------|--------|---------|
//! | `/status` | GET | liveness probe |
//! | `/stats`  | GET | chain/pool summary document |
//! | `/txs`    | POST | inject a client transaction (same path as gossip) |
//!
//! The gateway is a thin wrapper: it exposes exactly these three operations
//! over the [`NodeApi`] port and nothing more. Ledger and validation
//! rejections surface as a 400 with an error string; internal state never
//! leaks into responses.
//!
//! ## Tracker boundary
//!
//! The tracker service is an external collaborator serving the deployment's
//! address book as opaque JSON; [`tracker`] holds the client side
//! (`GET/POST {tracker}/nodes`).

#![warn(missing_docs)]
#![warn(clippy::all)]

mod errors;
mod ports;
mod service;
pub mod tracker;

pub use errors::GatewayError;
pub use ports::NodeApi;
pub use service::{router, serve};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
