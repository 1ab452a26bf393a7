//! Overlay error types.

use shared_types::ChainId;
use thiserror::Error;

/// Overlay failures.
///
/// Bind errors surface at startup and are the embedding application's
/// problem; everything else is logged and tolerated.
#[derive(Debug, Error)]
pub enum OverlayError {
    /// Listener or outbound socket failure.
    #[error("socket error: {0}")]
    Io(#[from] std::io::Error),

    /// A point-to-point send was requested for a channel with no link.
    #[error("no interchange link for channel {0}")]
    NoInterchangeLink(ChainId),

    /// A message could not be encoded for the wire.
    #[error(transparent)]
    Wire(#[from] shared_types::WireError),
}
