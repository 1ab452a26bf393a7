//! The node state machine.

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use lc_01_authority::Authority;
use lc_02_ledger::AccountLedger;
use lc_03_block_storage::BlockStorage;
use lc_04_peer_overlay::{MessageHandler, Peer};
use parking_lot::Mutex;
use primitive_types::U256;
use shared_crypto::Keypair;
use shared_types::{
    Address, Block, BlockBody, BlockHeader, BlockVote, ChainId, Hash, Message, MessageType,
    ShardCommit, Tx, TxPayload, BASECHAIN,
};
use tokio::sync::{mpsc, Notify};
use tracing::{debug, info, warn};

use crate::applier::LedgerApplier;
use crate::domain::{NodeStats, PendingPool};
use crate::errors::ConsensusError;
use crate::ports::ContractExecutor;
use crate::validation;

/// Consensus timing and sizing for one node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Signing secret for proposals and votes.
    pub secret: String,
    /// Block production interval, also the vote-timeout deadline.
    pub block_time: Duration,
    /// Maximum transactions per block body.
    pub block_size: usize,
}

/// A leader's proposal awaiting quorum.
struct OutstandingProposal {
    block: Block,
    proposed_at: Instant,
}

struct NodeShared {
    config: NodeConfig,
    chain: ChainId,
    is_leader: bool,
    authority: Arc<Authority>,
    keypair: Keypair,
    peer: Peer,
    accounts: Arc<Mutex<AccountLedger>>,
    blocks: Mutex<BlockStorage>,
    pending: Mutex<PendingPool>,
    outstanding: Mutex<Option<OutstandingProposal>>,
    proposal_cleared: Notify,
    voted_on: Mutex<Option<Hash>>,
    outbound_rx: Mutex<Option<mpsc::UnboundedReceiver<(ChainId, Tx)>>>,
}

/// One shard participant: overlay subscriber, ledger owner, and (when the
/// authority says so) block producer.
///
/// Cheap to clone; all clones share one state.
#[derive(Clone)]
pub struct Node {
    inner: Arc<NodeShared>,
}

impl Node {
    /// Wire a node onto its overlay endpoint.
    ///
    /// Determines the chain and leader flag from the authority table,
    /// subscribes the overlay, installs the ledger-applying acceptance hook,
    /// seeds the deterministic genesis block, and registers the protocol
    /// message handlers. A chain without a committee is a configuration
    /// error and startup-fatal.
    pub fn new(
        config: NodeConfig,
        authority: Arc<Authority>,
        peer: Peer,
        executor: Arc<dyn ContractExecutor>,
    ) -> Result<Self, ConsensusError> {
        let chain = authority.chain_of(peer.id());
        if authority.validators_of(&chain).is_empty() {
            return Err(ConsensusError::NoValidators(chain));
        }
        let is_leader = authority.is_leader(&chain, peer.id());
        peer.subscribe_to_channel(&chain);

        let accounts = Arc::new(Mutex::new(AccountLedger::new()));
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let applier = Arc::new(LedgerApplier::new(
            chain.clone(),
            authority.clone(),
            accounts.clone(),
            outbound_tx,
            executor,
        ));

        let keypair = Keypair::new(config.secret.clone());
        let node = Self {
            inner: Arc::new(NodeShared {
                config,
                chain: chain.clone(),
                is_leader,
                authority,
                keypair,
                peer,
                accounts,
                blocks: Mutex::new(BlockStorage::new(applier)),
                pending: Mutex::new(PendingPool::new()),
                outstanding: Mutex::new(None),
                proposal_cleared: Notify::new(),
                voted_on: Mutex::new(None),
                outbound_rx: Mutex::new(Some(outbound_rx)),
            }),
        };

        if !node.inner.blocks.lock().add(Block::genesis(&chain)) {
            return Err(ConsensusError::GenesisRejected);
        }

        let handler: Arc<dyn MessageHandler> = Arc::new(NodeMessageHandler { node: node.clone() });
        for msg_type in [
            MessageType::Tx,
            MessageType::Block,
            MessageType::BlockProposal,
            MessageType::BlockVote,
        ] {
            node.inner.peer.set_message_handler(msg_type, handler.clone());
        }

        info!(
            id = node.inner.peer.id(),
            chain = %chain,
            is_leader,
            "node wired"
        );
        Ok(node)
    }

    /// Start the overlay, the interchange forwarder, and (for the leader)
    /// block production.
    pub async fn start(&self) -> Result<(), ConsensusError> {
        self.inner.peer.start().await?;

        if let Some(outbound_rx) = self.inner.outbound_rx.lock().take() {
            let node = self.clone();
            tokio::spawn(async move {
                node.run_outbound(outbound_rx).await;
            });
        }

        if self.inner.is_leader {
            let node = self.clone();
            tokio::spawn(async move {
                node.run_block_production().await;
            });
        }

        Ok(())
    }

    /// The chain this node validates.
    pub fn chain(&self) -> &str {
        &self.inner.chain
    }

    /// Whether this node leads its chain.
    pub fn is_leader(&self) -> bool {
        self.inner.is_leader
    }

    /// The overlay endpoint (for bootstrap dialing).
    pub fn peer(&self) -> &Peer {
        &self.inner.peer
    }

    /// Credit an account (genesis/faucet allocation).
    pub fn issue(&self, address: &Address, amount: U256) {
        self.inner.accounts.lock().issue(address, amount);
    }

    /// Current balance of an account.
    pub fn balance(&self, address: &Address) -> U256 {
        self.inner.accounts.lock().balance(address)
    }

    /// Number of pending transactions.
    pub fn pending_len(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// The current tip.
    pub fn tip(&self) -> Option<Block> {
        self.inner.blocks.lock().last().cloned()
    }

    /// Point-in-time stats for the HTTP facade.
    pub fn stats(&self) -> NodeStats {
        let blocks = self.inner.blocks.lock();
        let tip = blocks.last();
        let committed_blocks = blocks.len().saturating_sub(1);
        let total_tx_number: usize = blocks.iter().map(|block| block.body.txs.len()).sum();

        NodeStats {
            chain: self.inner.chain.clone(),
            block_height: tip.map(|block| block.header.height).unwrap_or(0),
            block_hash: tip.map(|block| block.hash.clone()).unwrap_or_default(),
            block_tx_number: tip.map(|block| block.body.txs.len()).unwrap_or(0),
            total_tx_number,
            avg_tx_number: if committed_blocks > 0 {
                total_tx_number as f64 / committed_blocks as f64
            } else {
                0.0
            },
            pending_tx_number: self.inner.pending.lock().len(),
        }
    }

    /// Inject a client-submitted transaction.
    ///
    /// Same path as gossip intake, but rejections are surfaced to the
    /// caller so the HTTP facade can answer with a non-200.
    pub fn submit_tx(&self, tx: Tx) -> Result<(), ConsensusError> {
        self.admit(&tx)?;

        match Message::tx(&self.inner.chain, &tx) {
            Ok(msg) => self.inner.peer.broadcast(&msg),
            Err(error) => warn!(%error, "failed to encode transaction gossip"),
        }
        Ok(())
    }

    /// Dedup plus intake validation; admitted transactions enter the pool.
    fn admit(&self, tx: &Tx) -> Result<(), ConsensusError> {
        if self.inner.pending.lock().contains(&tx.hash) {
            return Err(ConsensusError::DuplicateTransaction);
        }
        if self.inner.blocks.lock().contains_tx(&tx.hash) {
            return Err(ConsensusError::DuplicateTransaction);
        }

        {
            let accounts = self.inner.accounts.lock();
            validation::admit_transaction(tx, &self.inner.chain, &accounts)
                .map_err(ConsensusError::InvalidTransaction)?;
        }

        self.inner.pending.lock().insert(tx.clone());
        Ok(())
    }

    async fn handle_tx(&self, msg: Message) {
        let tx: Tx = match msg.decode_data() {
            Ok(tx) => tx,
            Err(error) => {
                warn!(id = self.inner.peer.id(), %error, "malformed transaction, dropped");
                return;
            }
        };

        match self.admit(&tx) {
            Ok(()) => {
                debug!(id = self.inner.peer.id(), tx = %tx.hash, "transaction admitted");
                self.inner.peer.broadcast(&msg);
            }
            Err(ConsensusError::DuplicateTransaction) => {}
            Err(error) => {
                debug!(id = self.inner.peer.id(), tx = %tx.hash, %error, "transaction rejected")
            }
        }
    }

    async fn handle_block_proposal(&self, msg: Message) {
        // Flood before validating: propagation latency beats bandwidth here.
        self.inner.peer.broadcast(&msg);

        let block: Block = match msg.decode_data() {
            Ok(block) => block,
            Err(error) => {
                warn!(id = self.inner.peer.id(), %error, "malformed proposal, dropped");
                return;
            }
        };

        if self.inner.is_leader {
            // Our own proposal flooding back; its signature is already on it.
            return;
        }
        if self.inner.voted_on.lock().as_deref() == Some(block.hash.as_str()) {
            return;
        }

        {
            let accounts = self.inner.accounts.lock();
            if let Err(reason) = validation::validate_proposal(
                &block,
                &self.inner.chain,
                self.inner.config.block_size,
                &accounts,
            ) {
                warn!(
                    id = self.inner.peer.id(),
                    block = %block.hash,
                    reason,
                    "proposal rejected, not voting"
                );
                return;
            }
        }

        let mut signed = block.clone();
        signed.sign(&self.inner.keypair);
        let own_key = self.inner.keypair.public_key();
        let Some(signature) = signed
            .signatures
            .iter()
            .find(|sig| sig.public_key == own_key)
            .cloned()
        else {
            return;
        };

        *self.inner.voted_on.lock() = Some(block.hash.clone());
        let vote = BlockVote {
            block_proposal_hash: block.hash.clone(),
            signature,
        };
        debug!(id = self.inner.peer.id(), block = %block.hash, "voting");
        match Message::block_vote(&self.inner.chain, &vote) {
            Ok(msg) => self.inner.peer.broadcast(&msg),
            Err(error) => warn!(%error, "failed to encode vote"),
        }
    }

    async fn handle_block_vote(&self, msg: Message) {
        // Votes flood the shard channel so the leader hears them on any path.
        self.inner.peer.broadcast(&msg);

        if !self.inner.is_leader {
            return;
        }

        let vote: BlockVote = match msg.decode_data() {
            Ok(vote) => vote,
            Err(error) => {
                warn!(id = self.inner.peer.id(), %error, "malformed vote, dropped");
                return;
            }
        };

        {
            let mut outstanding = self.inner.outstanding.lock();
            let Some(proposal) = outstanding.as_mut() else {
                return;
            };
            if proposal.block.hash != vote.block_proposal_hash {
                debug!(
                    id = self.inner.peer.id(),
                    vote = %vote.block_proposal_hash,
                    "stale or foreign vote, ignored"
                );
                return;
            }
            if !proposal.block.validate_signature(&vote.signature) {
                warn!(id = self.inner.peer.id(), "invalid vote signature, ignored");
                return;
            }
            proposal.block.add_signature(vote.signature);
        }

        self.try_commit();
    }

    async fn handle_block(&self, msg: Message) {
        self.inner.peer.broadcast(&msg);

        let block: Block = match msg.decode_data() {
            Ok(block) => block,
            Err(error) => {
                warn!(id = self.inner.peer.id(), %error, "malformed block, dropped");
                return;
            }
        };

        if block.header.chain != self.inner.chain {
            warn!(id = self.inner.peer.id(), chain = %block.header.chain, "foreign block, dropped");
            return;
        }
        if !block.verify_hash() {
            warn!(id = self.inner.peer.id(), "block hash mismatch, dropped");
            return;
        }
        if self.inner.blocks.lock().get_by_hash(&block.hash).is_some() {
            return;
        }

        let validators = self.inner.authority.validators_of(&self.inner.chain).len();
        if !validation::verify_committed_signatures(&block, validators) {
            warn!(
                id = self.inner.peer.id(),
                block = %block.hash,
                "finalized block without quorum signatures, dropped"
            );
            return;
        }

        let added = self.inner.blocks.lock().add(block.clone());
        if added {
            self.finish_append(&block);
        } else {
            debug!(
                id = self.inner.peer.id(),
                block = %block.hash,
                "block does not extend the tip, dropped"
            );
        }
    }

    /// Leader tick loop: propose when the slot is free, otherwise wait for
    /// the commit/discard signal while re-checking the vote deadline on
    /// every further tick.
    async fn run_block_production(self) {
        let mut interval = tokio::time::interval(self.inner.config.block_time);
        interval.tick().await; // completes immediately

        loop {
            interval.tick().await;
            self.try_commit();

            loop {
                if self.inner.outstanding.lock().is_none() {
                    break;
                }
                tokio::select! {
                    _ = self.inner.proposal_cleared.notified() => break,
                    _ = interval.tick() => self.try_commit(),
                }
            }

            self.propose_block();
        }
    }

    fn propose_block(&self) {
        let Some(tip) = self.tip() else { return };

        let txs = {
            let accounts = self.inner.accounts.lock();
            let pending = self.inner.pending.lock();
            pending.select(self.inner.config.block_size, |tx| {
                validation::admit_transaction(tx, &self.inner.chain, &accounts).is_ok()
            })
        };
        if txs.is_empty() {
            return;
        }

        let mut block = Block::new(
            BlockHeader {
                chain: self.inner.chain.clone(),
                timestamp: now_millis(),
                height: tip.header.height + 1,
                parent_block_hash: tip.hash.clone(),
            },
            BlockBody { txs },
        );
        block.sign(&self.inner.keypair);

        info!(
            id = self.inner.peer.id(),
            height = block.header.height,
            txs = block.body.txs.len(),
            block = %block.hash,
            "proposing block"
        );
        *self.inner.outstanding.lock() = Some(OutstandingProposal {
            block: block.clone(),
            proposed_at: Instant::now(),
        });

        match Message::block_proposal(&self.inner.chain, &block) {
            Ok(msg) => self.inner.peer.broadcast(&msg),
            Err(error) => warn!(%error, "failed to encode proposal"),
        }

        // A single-validator committee is already unanimous.
        self.try_commit();
    }

    /// Evaluate the commit condition; called on every vote arrival and on
    /// every production tick, so a quorum reached at the deadline is not
    /// lost.
    fn try_commit(&self) {
        let block = {
            let mut outstanding = self.inner.outstanding.lock();
            let Some(proposal) = outstanding.as_ref() else {
                return;
            };

            let validators = self.inner.authority.validators_of(&self.inner.chain).len();
            let signatures = proposal.block.signatures.len();
            let timed_out = proposal.proposed_at.elapsed() > self.inner.config.block_time;
            if !validation::quorum_reached(signatures, validators, timed_out) {
                return;
            }

            outstanding.take().map(|proposal| proposal.block)
        };
        let Some(block) = block else { return };
        self.inner.proposal_cleared.notify_one();

        self.commit_block(block);
    }

    fn commit_block(&self, block: Block) {
        if !self.inner.blocks.lock().add(block.clone()) {
            warn!(
                id = self.inner.peer.id(),
                block = %block.hash,
                "commit refused by the store, proposal discarded"
            );
            return;
        }

        info!(
            id = self.inner.peer.id(),
            height = block.header.height,
            txs = block.body.txs.len(),
            signatures = block.signatures.len(),
            block = %block.hash,
            "block committed"
        );
        self.finish_append(&block);

        match Message::block(&self.inner.chain, &block) {
            Ok(msg) => self.inner.peer.broadcast(&msg),
            Err(error) => warn!(%error, "failed to encode block"),
        }

        // Anchor shard finality on basechain over the interchange link.
        if self.inner.chain != BASECHAIN {
            let commit = ShardCommit {
                block_hash: block.hash.clone(),
                chain: self.inner.chain.clone(),
                signatures: block.signatures.clone(),
            };
            let tx = Tx::new(TxPayload::ShardCommit(commit));
            self.send_interchange_tx(BASECHAIN, &tx);
        }
    }

    /// Pool cleanup shared by the commit path and finalized-block intake.
    fn finish_append(&self, block: &Block) {
        let hashes: Vec<Hash> = block.body.txs.iter().map(|tx| tx.hash.clone()).collect();
        self.inner.pending.lock().remove_many(&hashes);
    }

    fn send_interchange_tx(&self, channel: &str, tx: &Tx) {
        let msg = match Message::tx(channel, tx) {
            Ok(msg) => msg,
            Err(error) => {
                warn!(%error, "failed to encode interchange transaction");
                return;
            }
        };
        if let Err(error) = self.inner.peer.send_to_channel(channel, &msg) {
            // Only leaders hold interchange links; everyone else applies the
            // same block and simply has nowhere to send.
            debug!(id = self.inner.peer.id(), channel, %error, "interchange send skipped");
        }
    }

    /// Forward receipts queued by block application to their destination
    /// shards.
    async fn run_outbound(&self, mut outbound_rx: mpsc::UnboundedReceiver<(ChainId, Tx)>) {
        while let Some((channel, tx)) = outbound_rx.recv().await {
            self.send_interchange_tx(&channel, &tx);
        }
    }
}

struct NodeMessageHandler {
    node: Node,
}

#[async_trait]
impl MessageHandler for NodeMessageHandler {
    async fn handle(&self, msg: Message) {
        // The channel resolves to this shard's validation rules; anything
        // else was misrouted.
        if msg.channel.as_deref() != Some(self.node.chain()) {
            debug!(
                id = self.node.inner.peer.id(),
                channel = ?msg.channel,
                "message for another channel, dropped"
            );
            return;
        }

        match msg.msg_type {
            MessageType::Tx => self.node.handle_tx(msg).await,
            MessageType::BlockProposal => self.node.handle_block_proposal(msg).await,
            MessageType::BlockVote => self.node.handle_block_vote(msg).await,
            MessageType::Block => self.node.handle_block(msg).await,
            MessageType::Greeting | MessageType::Peers => {}
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}
