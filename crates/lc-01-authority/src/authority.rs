//! Validator table construction and address routing.

use std::collections::HashMap;

use primitive_types::U256;
use sha2::{Digest, Sha256};
use shared_types::{Address, ChainId, NodeId, BASECHAIN};

use crate::errors::AuthorityError;

/// Global network shape, fixed for the process lifetime.
#[derive(Debug, Clone, Copy)]
pub struct AuthorityConfig {
    /// Total number of nodes in the deployment.
    pub node_count: u64,
    /// Committee size per chain. The first slice of node ids validates
    /// basechain; every following slice validates one shard.
    pub validators_per_shard: u64,
}

/// The immutable validator/leader/routing table.
///
/// Built once from [`AuthorityConfig`] and shared read-only; nothing mutates
/// it after construction.
#[derive(Debug)]
pub struct Authority {
    config: AuthorityConfig,
    chains: Vec<ChainId>,
    validators: HashMap<ChainId, Vec<NodeId>>,
}

impl Authority {
    /// Compute the validator table.
    ///
    /// Node `i` validates basechain when `i < validators_per_shard`, else
    /// `shard_{i / validators_per_shard}`. Committee order follows node id,
    /// and the first member of each committee is its leader.
    pub fn new(config: AuthorityConfig) -> Result<Self, AuthorityError> {
        if config.node_count == 0 {
            return Err(AuthorityError::InvalidConfig(
                "node_count must be positive".to_string(),
            ));
        }
        if config.validators_per_shard == 0 {
            return Err(AuthorityError::InvalidConfig(
                "validators_per_shard must be positive".to_string(),
            ));
        }

        let mut chains: Vec<ChainId> = Vec::new();
        let mut validators: HashMap<ChainId, Vec<NodeId>> = HashMap::new();

        for node_id in 0..config.node_count {
            let chain = Self::chain_for(node_id, config.validators_per_shard);
            let committee = validators.entry(chain.clone()).or_insert_with(|| {
                chains.push(chain.clone());
                Vec::new()
            });
            committee.push(node_id);
        }

        Ok(Self {
            config,
            chains,
            validators,
        })
    }

    fn chain_for(node_id: NodeId, validators_per_shard: u64) -> ChainId {
        if node_id < validators_per_shard {
            BASECHAIN.to_string()
        } else {
            format!("shard_{}", node_id / validators_per_shard)
        }
    }

    /// All chains, in construction order (basechain first).
    pub fn chains(&self) -> &[ChainId] {
        &self.chains
    }

    /// Number of `shard_*` chains (basechain excluded).
    pub fn shard_count(&self) -> u64 {
        self.chains.len().saturating_sub(1) as u64
    }

    /// The chain a node validates.
    pub fn chain_of(&self, node_id: NodeId) -> ChainId {
        Self::chain_for(node_id, self.config.validators_per_shard)
    }

    /// Ordered validator committee of a chain; empty for unknown chains.
    pub fn validators_of(&self, chain: &str) -> &[NodeId] {
        self.validators.get(chain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The chain's leader: the first committee member.
    pub fn leader_of(&self, chain: &str) -> Result<NodeId, AuthorityError> {
        self.validators_of(chain)
            .first()
            .copied()
            .ok_or_else(|| AuthorityError::EmptyChain(chain.to_string()))
    }

    /// Whether a node sits on a chain's committee.
    pub fn is_validator(&self, chain: &str, node_id: NodeId) -> bool {
        self.validators_of(chain).contains(&node_id)
    }

    /// Whether a node leads a chain.
    pub fn is_leader(&self, chain: &str, node_id: NodeId) -> bool {
        self.validators_of(chain).first() == Some(&node_id)
    }

    /// Route an account address to its settlement shard.
    ///
    /// SHA-256 the address, read the digest as a big-endian integer, reduce
    /// modulo the shard count. Shards are numbered from 1 (basechain owns
    /// the first validator slice), so the remainder is shifted by one. A
    /// deployment with no shards routes everything to basechain.
    pub fn shard_of(&self, address: &Address) -> ChainId {
        let shard_count = self.shard_count();
        if shard_count == 0 {
            return BASECHAIN.to_string();
        }

        let mut hasher = Sha256::new();
        hasher.update(address.as_bytes());
        let digest = hasher.finalize();

        let value = U256::from_big_endian(&digest);
        let shard_number = (value % U256::from(shard_count)).as_u64() + 1;

        format!("shard_{shard_number}")
    }
}
