//! Consensus error types.

use lc_04_peer_overlay::OverlayError;
use shared_types::ChainId;
use thiserror::Error;

/// Node engine failures.
///
/// Construction errors are startup-fatal configuration problems; transaction
/// errors are value-level rejections surfaced to the HTTP facade.
#[derive(Debug, Error)]
pub enum ConsensusError {
    /// The authority table has no committee for this node's chain.
    #[error("no validator set configured for chain {0}")]
    NoValidators(ChainId),

    /// The deterministic genesis block was refused by the store.
    #[error("genesis block was refused by the store")]
    GenesisRejected,

    /// Overlay startup failure.
    #[error(transparent)]
    Overlay(#[from] OverlayError),

    /// The transaction is already pending or committed.
    #[error("transaction already known")]
    DuplicateTransaction,

    /// The transaction failed intake validation.
    #[error("transaction failed validation: {0}")]
    InvalidTransaction(&'static str),
}
