//! Inbound port: message dispatch.

use async_trait::async_trait;
use shared_types::Message;

/// Handler for one wire message type.
///
/// The node engine registers one implementation per protocol message type
/// (tx, block, block_proposal, block_vote); greeting and peers messages are
/// handled inside the overlay itself. Handlers run on the receiving
/// connection's task, so messages from one connection are processed in send
/// order while different connections proceed concurrently.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one inbound message.
    async fn handle(&self, msg: Message);
}
