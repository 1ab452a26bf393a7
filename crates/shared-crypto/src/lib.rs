//! # Shared Crypto - Hashing and Signing Primitives
//!
//! Deterministic object hashing and message authentication shared by every
//! Lattice-Chain subsystem.
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | canonical JSON + SHA-256 | Tx/Block identity, address routing |
//! | `signatures` | HMAC-SHA256 | Tx/Block/vote authentication |
//!
//! ## Determinism
//!
//! Every node must derive the same hash for the same logical object without
//! coordination, so hashing runs over a canonical JSON encoding: object keys
//! sorted recursively, no insignificant whitespace. The canonical form is a
//! hashing detail only and never appears on the wire.
//!
//! ## Key model
//!
//! The reference scheme is symmetric: a [`Keypair`]'s public identity is the
//! secret itself, which is enough for a demonstration network where nodes and
//! accounts are addressed by opaque strings. Signing and verification stay
//! separate operations with separate key arguments so an asymmetric scheme
//! can replace the implementation without touching call sites.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod hashing;
pub mod signatures;

// Re-exports
pub use hashing::{object_hash, sha256_hex};
pub use signatures::{sign_object, verify_object_signature, Keypair};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
