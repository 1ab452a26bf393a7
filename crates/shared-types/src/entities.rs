//! # Core Domain Entities
//!
//! The ledger's value objects: transaction payloads, the transaction
//! envelope, blocks, and votes.
//!
//! ## Clusters
//!
//! - **Transactions**: [`ValueTransfer`], [`Receipt`], [`ShardCommit`],
//!   contract payloads, the [`TxPayload`] sum type and the [`Tx`] envelope
//! - **Chain**: [`BlockHeader`], [`BlockBody`], [`Block`], [`BlockVote`]
//! - **Addressing**: [`NodeInfo`], the `Hash`/`Address`/`ChainId` aliases
//!
//! Hashes and signatures are computed over explicit field subsets (never over
//! the serialized wire form), so re-deriving them on the receiving side is
//! always possible and always required.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use shared_crypto::{object_hash, verify_object_signature, Keypair};

/// Lowercase hex SHA-256 digest.
pub type Hash = String;

/// An account address (opaque hex string).
pub type Address = String;

/// A chain name: `basechain` or `shard_<n>`. Doubles as the gossip channel
/// name for that chain's validator committee.
pub type ChainId = String;

/// Node identifier assigned by deployment configuration.
pub type NodeId = u64;

/// The coordination chain that anchors shard finality.
pub const BASECHAIN: &str = "basechain";

/// Parent hash of every genesis block.
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// A validator's signature over a block hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    /// Identity the signature verifies against.
    pub public_key: String,
    /// Hex HMAC output.
    pub signature: String,
}

/// Parse a wire amount (decimal string) into a U256.
///
/// Returns `None` for anything that is not a plain decimal integer.
pub fn parse_amount(amount: &str) -> Option<U256> {
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(amount).ok()
}

// =============================================================================
// TRANSACTION PAYLOADS
// =============================================================================

/// An in-shard or cross-shard transfer of value, signed by the sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueTransfer {
    /// Sender address.
    pub from: Address,
    /// Recipient address (may route to another shard).
    pub to: Address,
    /// Amount as a decimal string.
    pub amount: String,
    /// Sender's signature over `{from, to, amount}`.
    #[serde(default)]
    pub signature: String,
}

impl ValueTransfer {
    fn signing_payload(&self) -> Value {
        json!({
            "from": self.from,
            "to": self.to,
            "amount": self.amount,
        })
    }

    /// Sign with the sender's secret.
    pub fn sign(&mut self, secret: &str) {
        self.signature = Keypair::new(secret).sign(&self.signing_payload());
    }

    /// Verify against the claimed signer identity.
    pub fn verify_signature(&self, identity: &str) -> bool {
        verify_object_signature(identity, &self.signature, &self.signing_payload())
    }

    /// Parsed amount, `None` when malformed.
    pub fn amount(&self) -> Option<U256> {
        parse_amount(&self.amount)
    }
}

/// A pending credit owed to an address on another shard.
///
/// Produced by the origin shard when a [`ValueTransfer`]'s destination routes
/// elsewhere. Unsigned: trust derives from the destination chain's own
/// consensus and from the origin shard's commit anchored on basechain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    /// Origin-shard block the debit was committed in.
    pub block_hash: Hash,
    /// Hash of the originating transfer.
    pub original_tx_hash: Hash,
    /// Destination address.
    pub to: Address,
    /// Amount as a decimal string.
    pub amount: String,
}

impl Receipt {
    /// Parsed amount, `None` when malformed.
    pub fn amount(&self) -> Option<U256> {
        parse_amount(&self.amount)
    }
}

/// A shard's assertion that it committed a block, carried to basechain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardCommit {
    /// Hash of the committed shard block.
    pub block_hash: Hash,
    /// The committing chain.
    pub chain: ChainId,
    /// The committee signatures collected at commit time.
    pub signatures: Vec<SignatureInfo>,
}

impl ShardCommit {
    /// Re-derive and check every signature against `{hash: block_hash}`.
    ///
    /// The result must be unanimous: a single bad signature (or an empty
    /// list) invalidates the whole commit.
    pub fn verify_signatures(&self) -> bool {
        if self.signatures.is_empty() {
            return false;
        }

        let payload = json!({ "hash": self.block_hash });
        self.signatures
            .iter()
            .all(|sig| verify_object_signature(&sig.public_key, &sig.signature, &payload))
    }
}

/// Contract installation payload. Carried and signature-checked by the core,
/// executed (if at all) by a pluggable capability outside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetContract {
    /// Installing account.
    pub from: Address,
    /// Contract source, opaque to the core.
    pub code: String,
    /// Signature over `{from, code}`.
    #[serde(default)]
    pub signature: String,
}

impl SetContract {
    fn signing_payload(&self) -> Value {
        json!({ "from": self.from, "code": self.code })
    }

    /// Sign with the installer's secret.
    pub fn sign(&mut self, secret: &str) {
        self.signature = Keypair::new(secret).sign(&self.signing_payload());
    }

    /// Verify against the claimed signer identity.
    pub fn verify_signature(&self, identity: &str) -> bool {
        verify_object_signature(identity, &self.signature, &self.signing_payload())
    }
}

/// Contract invocation payload. Same carrying rules as [`SetContract`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteContract {
    /// Calling account.
    pub from: Address,
    /// Hash of the transaction that installed the contract.
    pub contract: Hash,
    /// Call input, opaque to the core.
    #[serde(default)]
    pub input: Value,
    /// Signature over `{from, contract, input}`.
    #[serde(default)]
    pub signature: String,
}

impl ExecuteContract {
    fn signing_payload(&self) -> Value {
        json!({
            "from": self.from,
            "contract": self.contract,
            "input": self.input,
        })
    }

    /// Sign with the caller's secret.
    pub fn sign(&mut self, secret: &str) {
        self.signature = Keypair::new(secret).sign(&self.signing_payload());
    }

    /// Verify against the claimed signer identity.
    pub fn verify_signature(&self, identity: &str) -> bool {
        verify_object_signature(identity, &self.signature, &self.signing_payload())
    }
}

// =============================================================================
// TRANSACTION ENVELOPE
// =============================================================================

/// Payload discriminator, also the wire value of a [`Tx`]'s `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxType {
    /// [`ValueTransfer`] payload.
    ValueTransfer,
    /// [`Receipt`] payload.
    Receipt,
    /// [`ShardCommit`] payload.
    ShardCommit,
    /// [`SetContract`] payload.
    SetContract,
    /// [`ExecuteContract`] payload.
    ExecuteContract,
}

/// The closed set of transaction payloads.
///
/// Serializes untagged (just the payload fields); the enclosing [`Tx`]
/// carries the discriminator. Deserialization goes through [`Tx`], which
/// matches on the discriminator explicitly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TxPayload {
    /// Value moving between accounts.
    ValueTransfer(ValueTransfer),
    /// Cross-shard credit instruction.
    Receipt(Receipt),
    /// Shard finality assertion for basechain.
    ShardCommit(ShardCommit),
    /// Contract installation.
    SetContract(SetContract),
    /// Contract invocation.
    ExecuteContract(ExecuteContract),
}

impl TxPayload {
    /// The discriminator for this payload.
    pub fn tx_type(&self) -> TxType {
        match self {
            TxPayload::ValueTransfer(_) => TxType::ValueTransfer,
            TxPayload::Receipt(_) => TxType::Receipt,
            TxPayload::ShardCommit(_) => TxType::ShardCommit,
            TxPayload::SetContract(_) => TxType::SetContract,
            TxPayload::ExecuteContract(_) => TxType::ExecuteContract,
        }
    }
}

/// The transaction envelope: `{type, data, hash}`.
///
/// `hash` is derived from `{type, data}` at construction. A hash that arrives
/// from the network is advisory only; [`Tx::verify_hash`] re-derives it, and
/// a mismatch makes the transaction invalid (rejected, never repaired).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tx {
    /// Payload discriminator.
    #[serde(rename = "type")]
    pub tx_type: TxType,
    /// The payload itself.
    pub data: TxPayload,
    /// Identity hash over `{type, data}`.
    pub hash: Hash,
}

impl Tx {
    /// Build a transaction from a payload, deriving its hash.
    pub fn new(data: TxPayload) -> Self {
        let mut tx = Self {
            tx_type: data.tx_type(),
            data,
            hash: String::new(),
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// Hash over `{type, data}`. Signatures inside the payload are part of
    /// the hashed content; block signatures are not (they live on [`Block`]).
    pub fn compute_hash(&self) -> Hash {
        object_hash(&json!({ "type": self.tx_type, "data": self.data }))
    }

    /// Check the stored hash against a fresh derivation.
    pub fn verify_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

impl<'de> Deserialize<'de> for Tx {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TxWire {
            #[serde(rename = "type")]
            tx_type: TxType,
            data: Value,
            hash: Hash,
        }

        fn payload<'de, D, T>(data: Value) -> Result<T, D::Error>
        where
            D: serde::Deserializer<'de>,
            T: serde::de::DeserializeOwned,
        {
            serde_json::from_value(data).map_err(serde::de::Error::custom)
        }

        let wire = TxWire::deserialize(deserializer)?;
        let data = match wire.tx_type {
            TxType::ValueTransfer => TxPayload::ValueTransfer(payload::<D, _>(wire.data)?),
            TxType::Receipt => TxPayload::Receipt(payload::<D, _>(wire.data)?),
            TxType::ShardCommit => TxPayload::ShardCommit(payload::<D, _>(wire.data)?),
            TxType::SetContract => TxPayload::SetContract(payload::<D, _>(wire.data)?),
            TxType::ExecuteContract => TxPayload::ExecuteContract(payload::<D, _>(wire.data)?),
        };

        Ok(Tx {
            tx_type: wire.tx_type,
            data,
            hash: wire.hash,
        })
    }
}

// =============================================================================
// BLOCKS
// =============================================================================

/// Block metadata. `parent_block_hash` creates the chain linkage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockHeader {
    /// The chain this block extends.
    pub chain: ChainId,
    /// Proposal time, milliseconds since the epoch.
    pub timestamp: u64,
    /// Height in the chain; genesis is 0.
    pub height: u64,
    /// Hash of the parent block; [`ZERO_HASH`] for genesis.
    pub parent_block_hash: Hash,
}

/// The transactions a block carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockBody {
    /// Committed transactions, in proposal order.
    pub txs: Vec<Tx>,
}

/// A block: `{header, body, signatures, hash}`.
///
/// `hash` covers `{header, body}` only. Signatures are appended after the
/// hash is fixed (proposal signing, then one vote at a time), so they are
/// excluded from the hashed payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Block metadata.
    pub header: BlockHeader,
    /// Block contents.
    pub body: BlockBody,
    /// Validator signatures over `{hash}`, deduplicated by signature value.
    pub signatures: Vec<SignatureInfo>,
    /// Identity hash over `{header, body}`.
    pub hash: Hash,
}

impl Block {
    /// Build an unsigned block from header and body, deriving its hash.
    pub fn new(header: BlockHeader, body: BlockBody) -> Self {
        let mut block = Self {
            header,
            body,
            signatures: Vec::new(),
            hash: String::new(),
        };
        block.update_hash();
        block
    }

    /// The deterministic genesis block for a chain.
    ///
    /// Every node of a chain derives an identical genesis without
    /// coordination: zero parent, height 0, timestamp 0, empty body.
    pub fn genesis(chain: &str) -> Self {
        Self::new(
            BlockHeader {
                chain: chain.to_string(),
                timestamp: 0,
                height: 0,
                parent_block_hash: ZERO_HASH.to_string(),
            },
            BlockBody { txs: Vec::new() },
        )
    }

    /// Hash over `{header, body}`, signatures excluded.
    pub fn compute_hash(&self) -> Hash {
        object_hash(&json!({ "header": self.header, "body": self.body }))
    }

    /// Re-derive and store the hash.
    pub fn update_hash(&mut self) {
        self.hash = self.compute_hash();
    }

    /// Check the stored hash against a fresh derivation.
    pub fn verify_hash(&self) -> bool {
        self.hash == self.compute_hash()
    }

    fn signing_payload(&self) -> Value {
        json!({ "hash": self.hash })
    }

    /// Sign the block: fix the hash, then append `{public_key, signature}`
    /// over `{hash}` unless that signature value is already present.
    pub fn sign(&mut self, keypair: &Keypair) {
        self.update_hash();
        let signature = keypair.sign(&self.signing_payload());

        if !self.signatures.iter().any(|s| s.signature == signature) {
            self.signatures.push(SignatureInfo {
                public_key: keypair.public_key(),
                signature,
            });
        }
    }

    /// Append an externally produced signature with the same dedup rule.
    /// Returns whether the set grew.
    pub fn add_signature(&mut self, sig: SignatureInfo) -> bool {
        if self.signatures.iter().any(|s| s.signature == sig.signature) {
            return false;
        }
        self.signatures.push(sig);
        true
    }

    /// Check a vote's signature against the block's current hash.
    pub fn validate_signature(&self, sig: &SignatureInfo) -> bool {
        verify_object_signature(&sig.public_key, &sig.signature, &self.signing_payload())
    }

    /// Whether this block has the genesis shape.
    pub fn is_genesis(&self) -> bool {
        self.header.height == 0 && self.header.parent_block_hash == ZERO_HASH
    }
}

/// A validator's vote for an outstanding block proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockVote {
    /// Pre-vote hash of the proposal being voted on.
    pub block_proposal_hash: Hash,
    /// The voter's signature over `{hash}`.
    pub signature: SignatureInfo,
}

// =============================================================================
// ADDRESSING
// =============================================================================

/// A node's address-book entry, as published to and served by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    /// Node identifier.
    pub id: NodeId,
    /// Gossip listener host.
    pub host: String,
    /// Gossip listener port.
    pub port: u16,
    /// Dedicated port for cross-shard interchange links.
    pub interchange_port: u16,
    /// HTTP facade port.
    pub http_port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(from: &str, to: &str, amount: &str) -> ValueTransfer {
        let mut vt = ValueTransfer {
            from: from.to_string(),
            to: to.to_string(),
            amount: amount.to_string(),
            signature: String::new(),
        };
        vt.sign(from);
        vt
    }

    #[test]
    fn test_value_transfer_sign_verify() {
        let vt = transfer("alice", "bob", "40");
        assert!(vt.verify_signature("alice"));
        assert!(!vt.verify_signature("bob"));
    }

    #[test]
    fn test_value_transfer_mutation_breaks_signature() {
        let mut vt = transfer("alice", "bob", "40");
        vt.amount = "41".to_string();
        assert!(!vt.verify_signature("alice"));
    }

    #[test]
    fn test_tx_hash_integrity() {
        let tx = Tx::new(TxPayload::ValueTransfer(transfer("alice", "bob", "40")));
        assert!(tx.verify_hash());

        let mut tampered = tx.clone();
        tampered.data = TxPayload::ValueTransfer(transfer("alice", "bob", "41"));
        assert!(!tampered.verify_hash());
    }

    #[test]
    fn test_tx_wire_round_trip() {
        let tx = Tx::new(TxPayload::ValueTransfer(transfer("alice", "bob", "40")));
        let encoded = serde_json::to_string(&tx).unwrap();
        let decoded: Tx = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded, tx);
        assert!(decoded.verify_hash());
    }

    #[test]
    fn test_tx_claimed_hash_not_trusted() {
        let tx = Tx::new(TxPayload::ValueTransfer(transfer("alice", "bob", "40")));
        let mut wire: Value = serde_json::to_value(&tx).unwrap();
        wire["hash"] = Value::String("f".repeat(64));

        let decoded: Tx = serde_json::from_value(wire).unwrap();
        assert!(!decoded.verify_hash());
    }

    #[test]
    fn test_tx_rejects_mismatched_payload_shape() {
        // A receipt body under a value_transfer discriminator must not decode.
        let wire = serde_json::json!({
            "type": "value_transfer",
            "data": { "blockHash": "x", "originalTxHash": "y", "to": "bob", "amount": "1" },
            "hash": "00",
        });
        assert!(serde_json::from_value::<Tx>(wire).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("40"), Some(U256::from(40u64)));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-1"), None);
        assert_eq!(parse_amount("1.5"), None);
        assert_eq!(parse_amount("0x10"), None);
    }

    #[test]
    fn test_block_sign_is_idempotent() {
        let mut block = Block::genesis("shard_1");
        let keypair = Keypair::new("validator_10");
        block.sign(&keypair);
        block.sign(&keypair);

        assert_eq!(block.signatures.len(), 1);
        assert!(block.validate_signature(&block.signatures[0]));
    }

    #[test]
    fn test_block_add_signature_dedups() {
        let mut block = Block::genesis("shard_1");
        let keypair = Keypair::new("validator_10");
        block.sign(&keypair);

        let sig = block.signatures[0].clone();
        assert!(!block.add_signature(sig));
        assert_eq!(block.signatures.len(), 1);
    }

    #[test]
    fn test_block_hash_excludes_signatures() {
        let mut block = Block::genesis("shard_1");
        let before = block.hash.clone();
        block.sign(&Keypair::new("validator_10"));

        assert_eq!(block.hash, before);
        assert!(block.verify_hash());
    }

    #[test]
    fn test_block_hash_covers_header_and_body() {
        let mut block = Block::genesis("shard_1");
        block.header.height = 5;
        assert!(!block.verify_hash());
    }

    #[test]
    fn test_genesis_is_deterministic() {
        assert_eq!(Block::genesis("shard_1"), Block::genesis("shard_1"));
        assert_ne!(Block::genesis("shard_1").hash, Block::genesis("shard_2").hash);
        assert!(Block::genesis("shard_1").is_genesis());
    }

    #[test]
    fn test_shard_commit_unanimity() {
        let mut block = Block::genesis("shard_1");
        block.sign(&Keypair::new("validator_10"));
        block.sign(&Keypair::new("validator_11"));

        let mut commit = ShardCommit {
            block_hash: block.hash.clone(),
            chain: "shard_1".to_string(),
            signatures: block.signatures.clone(),
        };
        assert!(commit.verify_signatures());

        // One forged signature invalidates the whole commit.
        commit.signatures.push(SignatureInfo {
            public_key: "validator_12".to_string(),
            signature: "00".repeat(32),
        });
        assert!(!commit.verify_signatures());
    }

    #[test]
    fn test_shard_commit_empty_is_invalid() {
        let commit = ShardCommit {
            block_hash: "ab".repeat(32),
            chain: "shard_1".to_string(),
            signatures: Vec::new(),
        };
        assert!(!commit.verify_signatures());
    }
}
