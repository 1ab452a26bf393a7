//! Wire-level error types.

use thiserror::Error;

/// Failure to decode or build a wire message.
///
/// Always value-level: a wire error is logged and the offending message
/// dropped; it never tears down a connection or the process.
#[derive(Debug, Error)]
pub enum WireError {
    /// Malformed JSON or a payload that fails structural validation.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A protocol message arrived without its required channel.
    #[error("protocol message is missing its channel")]
    MissingChannel,
}
