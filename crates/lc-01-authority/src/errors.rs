//! Authority error types.

use shared_types::ChainId;
use thiserror::Error;

/// Authority construction and lookup errors.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// The global configuration cannot produce a usable validator table.
    #[error("invalid authority config: {0}")]
    InvalidConfig(String),

    /// A leader was requested for a chain with no validators.
    #[error("chain {0} has no validators")]
    EmptyChain(ChainId),
}
