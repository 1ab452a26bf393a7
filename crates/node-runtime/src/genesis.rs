//! Demo faucet allocation.
//!
//! The reference deployment funds a fixed, deterministic set of addresses so
//! traffic generators on every machine agree on who owns money. Each node
//! funds only the addresses that route to its own shard.

use lc_01_authority::Authority;
use lc_05_consensus::Node;
use primitive_types::U256;
use shared_crypto::sha256_hex;
use shared_types::Address;
use tracing::info;

/// Opening balance for every faucet address.
pub const FAUCET_ALLOCATION: u64 = 1_000_000;

/// Number of deterministic demo addresses.
pub const FAUCET_ADDRESS_COUNT: u32 = 100;

/// The deterministic demo address set: SHA-256 of "0".."99".
pub fn faucet_addresses() -> Vec<Address> {
    (0..FAUCET_ADDRESS_COUNT)
        .map(|i| sha256_hex(i.to_string().as_bytes()))
        .collect()
}

/// Fund the faucet addresses that settle on this node's shard.
pub fn allocate(node: &Node, authority: &Authority) {
    let mut funded = 0usize;
    for address in faucet_addresses() {
        if authority.shard_of(&address) == node.chain() {
            node.issue(&address, U256::from(FAUCET_ALLOCATION));
            funded += 1;
        }
    }
    info!(chain = node.chain(), funded, "faucet allocated");
}
