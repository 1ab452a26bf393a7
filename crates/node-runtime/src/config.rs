//! # Node Configuration
//!
//! Environment-driven settings for one node process. Node identity and
//! addressing are required; network shape and consensus timing have defaults
//! matching the reference deployment.
//!
//! | Variable | Required | Default | Meaning |
//! |----------|----------|---------|---------|
//! | `LC_NODE_ID` | yes | n/a | node id in the authority table |
//! | `LC_HOST` | yes | n/a | listen/advertise host |
//! | `LC_PORT` | yes | n/a | gossip port |
//! | `LC_INTERCHANGE_PORT` | yes | n/a | cross-shard link port |
//! | `LC_HTTP_PORT` | yes | n/a | HTTP facade port |
//! | `LC_TRACKER_URL` | yes | n/a | address-book service |
//! | `LC_NODE_COUNT` | no | 100 | deployment size |
//! | `LC_VALIDATORS_PER_SHARD` | no | 10 | committee size |
//! | `LC_BLOCK_TIME_MS` | no | 1000 | production interval / vote deadline |
//! | `LC_BLOCK_SIZE` | no | 100 | max transactions per block |
//! | `LC_CHANNEL_LIMIT` | no | 10 | per-channel peer directory limit |
//! | `LC_IS_SEED` | no | false | announce the peer directory to new connections |

use std::time::Duration;

use shared_types::NodeId;
use thiserror::Error;

/// Configuration errors, discovered at startup and process-fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// A variable was present but unparseable.
    #[error("invalid value for environment variable {0}")]
    InvalidVar(&'static str),
}

/// Complete runtime configuration for one node process.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// This node's id in the authority table.
    pub node_id: NodeId,
    /// Listen/advertise host.
    pub host: String,
    /// Gossip port.
    pub port: u16,
    /// Cross-shard interchange port.
    pub interchange_port: u16,
    /// HTTP facade port.
    pub http_port: u16,
    /// Tracker base URL.
    pub tracker_url: String,
    /// Deployment size.
    pub node_count: u64,
    /// Committee size per chain.
    pub validators_per_shard: u64,
    /// Block production interval, also the vote deadline.
    pub block_time: Duration,
    /// Maximum transactions per block.
    pub block_size: usize,
    /// Per-channel peer directory limit.
    pub channel_limit: usize,
    /// Whether this node announces its directory to new connections.
    pub is_seed: bool,
}

impl RuntimeConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            node_id: required(&get, "LC_NODE_ID")?,
            host: get("LC_HOST").ok_or(ConfigError::MissingVar("LC_HOST"))?,
            port: required(&get, "LC_PORT")?,
            interchange_port: required(&get, "LC_INTERCHANGE_PORT")?,
            http_port: required(&get, "LC_HTTP_PORT")?,
            tracker_url: get("LC_TRACKER_URL").ok_or(ConfigError::MissingVar("LC_TRACKER_URL"))?,
            node_count: optional(&get, "LC_NODE_COUNT", 100)?,
            validators_per_shard: optional(&get, "LC_VALIDATORS_PER_SHARD", 10)?,
            block_time: Duration::from_millis(optional(&get, "LC_BLOCK_TIME_MS", 1000)?),
            block_size: optional(&get, "LC_BLOCK_SIZE", 100)?,
            channel_limit: optional(&get, "LC_CHANNEL_LIMIT", 10)?,
            is_seed: optional(&get, "LC_IS_SEED", false)?,
        })
    }

    /// The signing secret for this node.
    ///
    /// The reference scheme derives it from the node id; a real deployment
    /// would load key material instead.
    pub fn secret(&self) -> String {
        format!("node_{}", self.node_id)
    }
}

fn required<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<T, ConfigError> {
    get(name)
        .ok_or(ConfigError::MissingVar(name))?
        .parse()
        .map_err(|_| ConfigError::InvalidVar(name))
}

fn optional<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match get(name) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidVar(name)),
        None => Ok(default),
    }
}
