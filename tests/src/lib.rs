//! # Lattice-Chain Test Suite
//!
//! Multi-node end-to-end scenarios over real localhost TCP: full clusters
//! wired the way the runtime wires them (leader dialing, interchange mesh),
//! driven through the same submit/gossip paths production traffic takes.

pub mod harness;

#[cfg(test)]
mod integration {
    mod scenarios;
}
