//! # Lattice-Chain Node Runtime
//!
//! Wiring for one shard participant: environment-driven configuration,
//! demo faucet allocation, and the bootstrap sequence that connects a node
//! into a running deployment.
//!
//! ## Modular Structure
//!
//! - `config` - environment parsing, the only process-fatal failure class
//! - `genesis` - deterministic faucet allocation per shard
//! - `runtime` - subsystem wiring and tracker-driven bootstrap
//!
//! The `node-runtime` binary runs one node; `generate-txs` and
//! `monitor-stats` are deployment-side helpers driving the HTTP facades.

pub mod config;
pub mod genesis;
pub mod runtime;
