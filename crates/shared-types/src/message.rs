//! # Wire Messages
//!
//! The overlay's envelope and bootstrap payloads. The wire format is one JSON
//! object per line over TCP: `{type, channel?, data, senderId?}`.
//!
//! `channel` is required on protocol messages (tx, block, block_proposal,
//! block_vote): it scopes gossip fan-out and resolves to the recipient
//! shard's validation rules. Bootstrap messages (greeting, peers) carry no
//! channel.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{Block, BlockVote, ChainId, NodeId, Tx};
use crate::errors::WireError;

/// Wire message discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    /// Connection handshake: id, channels, advertised address.
    Greeting,
    /// Seed announcement of the known-peer directory.
    Peers,
    /// Transaction gossip.
    Tx,
    /// Finalized block distribution.
    Block,
    /// Leader's block proposal.
    BlockProposal,
    /// Validator vote on an outstanding proposal.
    BlockVote,
}

/// The message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message discriminator.
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    /// Gossip channel, present on all protocol messages.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<ChainId>,
    /// Type-specific payload, decoded on demand.
    pub data: Value,
    /// Stamped by the forwarding peer; receivers drop their own echoes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<NodeId>,
}

impl Message {
    fn protocol(msg_type: MessageType, channel: &str, data: &impl Serialize) -> Result<Self, WireError> {
        Ok(Self {
            msg_type,
            channel: Some(channel.to_string()),
            data: serde_json::to_value(data)?,
            sender_id: None,
        })
    }

    fn bootstrap(msg_type: MessageType, data: &impl Serialize) -> Result<Self, WireError> {
        Ok(Self {
            msg_type,
            channel: None,
            data: serde_json::to_value(data)?,
            sender_id: None,
        })
    }

    /// A transaction gossip message.
    pub fn tx(channel: &str, tx: &Tx) -> Result<Self, WireError> {
        Self::protocol(MessageType::Tx, channel, tx)
    }

    /// A finalized block message.
    pub fn block(channel: &str, block: &Block) -> Result<Self, WireError> {
        Self::protocol(MessageType::Block, channel, block)
    }

    /// A block proposal message.
    pub fn block_proposal(channel: &str, block: &Block) -> Result<Self, WireError> {
        Self::protocol(MessageType::BlockProposal, channel, block)
    }

    /// A block vote message.
    pub fn block_vote(channel: &str, vote: &BlockVote) -> Result<Self, WireError> {
        Self::protocol(MessageType::BlockVote, channel, vote)
    }

    /// A greeting handshake message.
    pub fn greeting(data: &GreetingData) -> Result<Self, WireError> {
        Self::bootstrap(MessageType::Greeting, data)
    }

    /// A known-peers announcement.
    pub fn peers(data: &PeersData) -> Result<Self, WireError> {
        Self::bootstrap(MessageType::Peers, data)
    }

    /// Decode one wire line. Malformed input is a value-level error the
    /// caller logs and drops; it is never fatal to the connection.
    pub fn decode(line: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(line)?)
    }

    /// Encode for the wire (no trailing newline).
    pub fn encode(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the payload into its typed form, validating structure.
    pub fn decode_data<T: serde::de::DeserializeOwned>(&self) -> Result<T, WireError> {
        Ok(serde_json::from_value(self.data.clone())?)
    }

    /// The channel, or an error for protocol messages that must carry one.
    pub fn require_channel(&self) -> Result<&str, WireError> {
        self.channel.as_deref().ok_or(WireError::MissingChannel)
    }
}

/// Greeting payload: who is connecting and what it subscribes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreetingData {
    /// The connecting node's id.
    pub peer_id: NodeId,
    /// Channels the node announces subscription to.
    pub channels: Vec<ChainId>,
    /// Advertised gossip host.
    pub host: String,
    /// Advertised gossip port.
    pub port: u16,
}

/// One entry of a peers announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerRecord {
    /// Peer id.
    pub id: NodeId,
    /// Advertised gossip host.
    pub host: String,
    /// Advertised gossip port.
    pub port: u16,
    /// Channels the peer was registered under.
    pub channels: Vec<ChainId>,
}

/// Peers announcement payload, sent by seed peers to new connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeersData {
    /// The sender's current peer directory.
    pub peers: Vec<PeerRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{TxPayload, ValueTransfer};

    #[test]
    fn test_envelope_round_trip() {
        let greeting = GreetingData {
            peer_id: 12,
            channels: vec!["shard_1".to_string()],
            host: "127.0.0.1".to_string(),
            port: 7012,
        };
        let msg = Message::greeting(&greeting).unwrap();
        let line = msg.encode().unwrap();
        let decoded = Message::decode(&line).unwrap();

        assert_eq!(decoded.msg_type, MessageType::Greeting);
        assert_eq!(decoded.decode_data::<GreetingData>().unwrap(), greeting);
    }

    #[test]
    fn test_protocol_message_carries_channel() {
        let mut vt = ValueTransfer {
            from: "alice".to_string(),
            to: "bob".to_string(),
            amount: "1".to_string(),
            signature: String::new(),
        };
        vt.sign("alice");
        let tx = Tx::new(TxPayload::ValueTransfer(vt));
        let msg = Message::tx("shard_1", &tx).unwrap();

        assert_eq!(msg.require_channel().unwrap(), "shard_1");
        assert_eq!(msg.decode_data::<Tx>().unwrap(), tx);
    }

    #[test]
    fn test_bootstrap_message_has_no_channel() {
        let msg = Message::peers(&PeersData { peers: Vec::new() }).unwrap();
        assert!(msg.require_channel().is_err());
        // And the field is omitted on the wire entirely.
        assert!(!msg.encode().unwrap().contains("channel"));
    }

    #[test]
    fn test_malformed_line_is_an_error() {
        assert!(Message::decode("{not json").is_err());
        assert!(Message::decode(r#"{"type": "no_such_type", "data": {}}"#).is_err());
        assert!(Message::decode(r#"{"data": {}}"#).is_err());
    }

    #[test]
    fn test_wire_names_match_protocol() {
        let msg = Message::peers(&PeersData { peers: Vec::new() }).unwrap();
        assert!(msg.encode().unwrap().contains(r#""type":"peers""#));

        let line = r#"{"type":"block_proposal","channel":"shard_1","data":{},"senderId":3}"#;
        let decoded = Message::decode(line).unwrap();
        assert_eq!(decoded.msg_type, MessageType::BlockProposal);
        assert_eq!(decoded.sender_id, Some(3));
    }
}
