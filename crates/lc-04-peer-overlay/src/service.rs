//! The overlay service: listeners, connection lifecycle, gossip.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::json;
use shared_crypto::object_hash;
use shared_types::{ChainId, GreetingData, Message, MessageType, NodeId, PeerRecord, PeersData};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::{ConnectionHandle, HostPort, PeerAddResult, RemotePeer, RemotePeerStorage};
use crate::errors::OverlayError;
use crate::ports::MessageHandler;

/// Overlay configuration for one node.
#[derive(Debug, Clone)]
pub struct PeerConfig {
    /// This node's id, stamped on forwarded gossip.
    pub id: NodeId,
    /// Listen/advertise host.
    pub host: String,
    /// Gossip port.
    pub port: u16,
    /// Dedicated port accepting cross-shard interchange links.
    pub interchange_port: u16,
    /// Peers dialed best-effort at startup.
    pub seeds: Vec<HostPort>,
    /// Seed peers announce their full directory to new connections.
    pub is_seed: bool,
    /// Per-channel directory occupancy limit.
    pub channel_limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionKind {
    Gossip,
    Interchange,
}

enum GreetingOutcome {
    Registered(NodeId),
    Ignored,
    Close,
}

struct PeerShared {
    config: PeerConfig,
    channels: RwLock<Vec<ChainId>>,
    peers: RwLock<RemotePeerStorage>,
    handlers: RwLock<HashMap<MessageType, Arc<dyn MessageHandler>>>,
    interchange: RwLock<HashMap<ChainId, ConnectionHandle>>,
}

/// The overlay endpoint: two listeners, a peer directory, and the gossip
/// primitives the node engine builds on.
///
/// Cheap to clone; all clones share one directory.
#[derive(Clone)]
pub struct Peer {
    inner: Arc<PeerShared>,
}

impl Peer {
    /// Build an overlay endpoint (no sockets yet; see [`Peer::start`]).
    pub fn new(config: PeerConfig) -> Self {
        let channel_limit = config.channel_limit;
        Self {
            inner: Arc::new(PeerShared {
                config,
                channels: RwLock::new(Vec::new()),
                peers: RwLock::new(RemotePeerStorage::new(channel_limit)),
                handlers: RwLock::new(HashMap::new()),
                interchange: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// This node's id.
    pub fn id(&self) -> NodeId {
        self.inner.config.id
    }

    /// Channels this node subscribes to.
    pub fn channels(&self) -> Vec<ChainId> {
        self.inner.channels.read().clone()
    }

    /// Subscribe to a gossip channel (a chain name).
    pub fn subscribe_to_channel(&self, channel: &str) {
        self.inner.channels.write().push(channel.to_string());
        self.inner.peers.write().add_channel(channel);
    }

    /// Register the handler for one protocol message type.
    pub fn set_message_handler(&self, msg_type: MessageType, handler: Arc<dyn MessageHandler>) {
        self.inner.handlers.write().insert(msg_type, handler);
    }

    /// Whether a peer is currently registered.
    pub fn has_peer(&self, peer_id: NodeId) -> bool {
        self.inner.peers.read().has_peer(peer_id)
    }

    /// Snapshot of the directory, in announcement form.
    pub fn peer_records(&self) -> Vec<PeerRecord> {
        self.inner
            .peers
            .read()
            .all_peers()
            .into_iter()
            .map(|peer| PeerRecord {
                id: peer.id,
                host: peer.host,
                port: peer.port,
                channels: peer.channels,
            })
            .collect()
    }

    /// Ids currently registered under a channel.
    pub fn channel_peer_ids(&self, channel: &str) -> Vec<NodeId> {
        self.inner
            .peers
            .read()
            .peers_by_channel(channel)
            .into_iter()
            .map(|peer| peer.id)
            .collect()
    }

    /// Bind both listeners, then dial the configured seeds best-effort.
    pub async fn start(&self) -> Result<(), OverlayError> {
        let config = &self.inner.config;

        let gossip = TcpListener::bind((config.host.as_str(), config.port)).await?;
        let interchange =
            TcpListener::bind((config.host.as_str(), config.interchange_port)).await?;
        info!(
            id = config.id,
            port = config.port,
            interchange_port = config.interchange_port,
            "overlay listening"
        );

        self.spawn_accept_loop(gossip, ConnectionKind::Gossip);
        self.spawn_accept_loop(interchange, ConnectionKind::Interchange);

        for seed in config.seeds.clone() {
            if let Err(error) = self.connect(&seed.host, seed.port).await {
                warn!(host = %seed.host, port = seed.port, %error, "failed to connect to seed");
            }
        }

        Ok(())
    }

    /// Dial another node's gossip port.
    pub async fn connect(&self, host: &str, port: u16) -> Result<(), OverlayError> {
        let stream = TcpStream::connect((host, port)).await?;
        debug!(id = self.id(), host, port, "outgoing connection");
        self.spawn_connection(stream, ConnectionKind::Gossip);
        Ok(())
    }

    /// Open a persistent point-to-point link to another channel's leader,
    /// addressed by channel name. Interchange traffic is never flooded.
    pub async fn connect_channel_peer(
        &self,
        channel: &str,
        host: &str,
        port: u16,
    ) -> Result<(), OverlayError> {
        let stream = TcpStream::connect((host, port)).await?;
        let handle = self.spawn_connection(stream, ConnectionKind::Interchange);
        self.inner
            .interchange
            .write()
            .insert(channel.to_string(), handle);
        info!(id = self.id(), channel, host, port, "interchange link open");
        Ok(())
    }

    /// Send one message over the interchange link for a channel.
    pub fn send_to_channel(&self, channel: &str, msg: &Message) -> Result<(), OverlayError> {
        let handle = self
            .inner
            .interchange
            .read()
            .get(channel)
            .cloned()
            .ok_or_else(|| OverlayError::NoInterchangeLink(channel.to_string()))?;

        let mut out = msg.clone();
        out.sender_id = Some(self.id());
        let line = out.encode()?;

        if !handle.send_line(line) {
            self.inner.interchange.write().remove(channel);
            return Err(OverlayError::NoInterchangeLink(channel.to_string()));
        }
        Ok(())
    }

    /// Flood a message to the peers registered under its channel (all peers
    /// when the channel is unset), stamping our own sender id.
    ///
    /// The peer that carried the message to us is skipped, as is any
    /// connection whose duplicate window already saw this payload.
    pub fn broadcast(&self, msg: &Message) {
        let peers = {
            let directory = self.inner.peers.read();
            match &msg.channel {
                Some(channel) => directory.peers_by_channel(channel),
                None => directory.all_peers(),
            }
        };

        let hash = gossip_hash(msg);
        let mut out = msg.clone();
        out.sender_id = Some(self.id());
        let line = match out.encode() {
            Ok(line) => line,
            Err(error) => {
                warn!(%error, "failed to encode broadcast");
                return;
            }
        };

        for peer in peers {
            if msg.sender_id == Some(peer.id) {
                continue;
            }
            if !peer.handle.record_seen(&hash) {
                continue;
            }
            if !peer.handle.send_line(line.clone()) {
                debug!(peer = peer.id, "outbox closed, skipping");
            }
        }
    }

    fn spawn_accept_loop(&self, listener: TcpListener, kind: ConnectionKind) {
        let peer = self.clone();
        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        debug!(id = peer.id(), %addr, "incoming connection");
                        peer.spawn_connection(stream, kind);
                    }
                    Err(error) => {
                        warn!(id = peer.id(), %error, "accept failed");
                    }
                }
            }
        });
    }

    fn spawn_connection(&self, stream: TcpStream, kind: ConnectionKind) -> ConnectionHandle {
        let (read_half, mut write_half) = stream.into_split();
        let (outbox, mut inbox) = mpsc::unbounded_channel::<String>();
        let handle = ConnectionHandle::new(outbox);

        tokio::spawn(async move {
            while let Some(line) = inbox.recv().await {
                if write_half.write_all(line.as_bytes()).await.is_err() {
                    break;
                }
                if write_half.write_all(b"\n").await.is_err() {
                    break;
                }
            }
        });

        let peer = self.clone();
        let conn = handle.clone();
        tokio::spawn(async move {
            peer.run_reader(read_half, conn, kind).await;
        });

        handle
    }

    async fn run_reader(&self, read_half: OwnedReadHalf, conn: ConnectionHandle, kind: ConnectionKind) {
        if kind == ConnectionKind::Gossip {
            self.send_greeting(&conn);
            if self.inner.config.is_seed {
                self.announce_peers(&conn);
            }
        }

        let mut greeted: Option<NodeId> = None;
        let mut lines = BufReader::new(read_half).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(error) => {
                    debug!(id = self.id(), %error, "connection read failed");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }

            let msg = match Message::decode(&line) {
                Ok(msg) => msg,
                Err(error) => {
                    warn!(id = self.id(), %error, "dropping malformed message");
                    continue;
                }
            };
            conn.record_seen(&gossip_hash(&msg));

            match msg.msg_type {
                MessageType::Greeting => {
                    if kind == ConnectionKind::Interchange {
                        debug!(id = self.id(), "ignoring greeting on interchange link");
                        continue;
                    }
                    match self.handle_greeting(&msg, &conn) {
                        GreetingOutcome::Registered(peer_id) => greeted = Some(peer_id),
                        GreetingOutcome::Ignored => {}
                        GreetingOutcome::Close => break,
                    }
                }
                MessageType::Peers => self.handle_peers(&msg),
                msg_type => {
                    if msg.sender_id == Some(self.id()) {
                        // Our own gossip echoed back.
                        continue;
                    }
                    if let Err(error) = msg.require_channel() {
                        warn!(id = self.id(), ?msg_type, %error, "dropped");
                        continue;
                    }
                    let handler = self.inner.handlers.read().get(&msg_type).cloned();
                    match handler {
                        Some(handler) => handler.handle(msg).await,
                        None => debug!(id = self.id(), ?msg_type, "no handler registered"),
                    }
                }
            }
        }

        if let Some(peer_id) = greeted {
            self.inner.peers.write().remove_peer(peer_id);
            info!(id = self.id(), peer = peer_id, "peer disconnected");
        }
    }

    fn handle_greeting(&self, msg: &Message, conn: &ConnectionHandle) -> GreetingOutcome {
        let greeting: GreetingData = match msg.decode_data() {
            Ok(greeting) => greeting,
            Err(error) => {
                warn!(id = self.id(), %error, "malformed greeting");
                return GreetingOutcome::Ignored;
            }
        };

        let remote = RemotePeer {
            id: greeting.peer_id,
            channels: greeting.channels,
            host: greeting.host,
            port: greeting.port,
            handle: conn.clone(),
        };
        let peer_id = remote.id;

        match self.inner.peers.write().add_peer(remote) {
            PeerAddResult::Rejected => {
                info!(id = self.id(), peer = peer_id, "peer rejected, closing connection");
                GreetingOutcome::Close
            }
            result => {
                debug!(id = self.id(), peer = peer_id, ?result, "peer registered");
                GreetingOutcome::Registered(peer_id)
            }
        }
    }

    fn handle_peers(&self, msg: &Message) {
        let data: PeersData = match msg.decode_data() {
            Ok(data) => data,
            Err(error) => {
                warn!(id = self.id(), %error, "malformed peers announcement");
                return;
            }
        };

        for record in data.peers {
            if record.id == self.id() || self.has_peer(record.id) {
                continue;
            }
            let peer = self.clone();
            tokio::spawn(async move {
                if let Err(error) = peer.connect(&record.host, record.port).await {
                    warn!(
                        id = peer.id(),
                        target = record.id,
                        %error,
                        "failed to connect to announced peer"
                    );
                }
            });
        }
    }

    fn send_greeting(&self, conn: &ConnectionHandle) {
        let greeting = GreetingData {
            peer_id: self.id(),
            channels: self.channels(),
            host: self.inner.config.host.clone(),
            port: self.inner.config.port,
        };
        match Message::greeting(&greeting).and_then(|msg| msg.encode()) {
            Ok(line) => {
                conn.send_line(line);
            }
            Err(error) => warn!(id = self.id(), %error, "failed to encode greeting"),
        }
    }

    fn announce_peers(&self, conn: &ConnectionHandle) {
        let data = PeersData {
            peers: self.peer_records(),
        };
        match Message::peers(&data).and_then(|msg| msg.encode()) {
            Ok(line) => {
                conn.send_line(line);
            }
            Err(error) => warn!(id = self.id(), %error, "failed to encode peers announcement"),
        }
    }
}

/// Identity of a gossip payload for duplicate suppression.
///
/// Excludes the sender stamp: the same payload forwarded by different peers
/// is still the same payload.
fn gossip_hash(msg: &Message) -> String {
    object_hash(&json!({
        "type": msg.msg_type,
        "channel": msg.channel,
        "data": msg.data,
    }))
}
