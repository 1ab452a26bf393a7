//! Gateway error types.

use thiserror::Error;

/// HTTP surface and tracker client failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The HTTP listener could not be bound or served.
    #[error("http server error: {0}")]
    Server(#[from] std::io::Error),

    /// A tracker request failed or returned an unreadable body.
    #[error("tracker request failed: {0}")]
    Tracker(#[from] reqwest::Error),
}
