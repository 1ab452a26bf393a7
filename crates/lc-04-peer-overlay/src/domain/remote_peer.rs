//! The bounded per-channel peer directory.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use shared_types::{ChainId, NodeId};
use tokio::sync::mpsc;

use super::dedup::DedupWindow;

/// A plain host/port pair (seed addresses, advertised endpoints).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Write side of a live connection.
///
/// Lines queued on the outbox are written by the connection's writer task;
/// the duplicate window tracks hashes carried on this connection in either
/// direction. Dropping the last clone closes the connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    outbox: mpsc::UnboundedSender<String>,
    window: Arc<Mutex<DedupWindow>>,
}

impl ConnectionHandle {
    /// Wrap a connection's outbox.
    pub fn new(outbox: mpsc::UnboundedSender<String>) -> Self {
        Self {
            outbox,
            window: Arc::new(Mutex::new(DedupWindow::default())),
        }
    }

    /// Queue one wire line. Returns false when the connection is gone.
    pub fn send_line(&self, line: String) -> bool {
        self.outbox.send(line).is_ok()
    }

    /// Record a hash seen on this connection. False when already seen.
    pub fn record_seen(&self, hash: &str) -> bool {
        self.window.lock().insert(hash)
    }

    /// Whether this connection already carried a hash.
    pub fn has_seen(&self, hash: &str) -> bool {
        self.window.lock().contains(hash)
    }
}

/// A verified remote peer: greeting data plus the live connection.
#[derive(Debug, Clone)]
pub struct RemotePeer {
    /// The peer's node id.
    pub id: NodeId,
    /// Channels the peer announced subscription to.
    pub channels: Vec<ChainId>,
    /// Advertised gossip host.
    pub host: String,
    /// Advertised gossip port.
    pub port: u16,
    /// The connection the greeting arrived on.
    pub handle: ConnectionHandle,
}

/// Outcome of a directory registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerAddResult {
    /// Admitted under at least one newly occupied channel slot.
    Added,
    /// Already registered; the record was refreshed.
    Updated,
    /// No tracked channel had room (or none matched); caller closes the
    /// socket.
    Rejected,
}

/// Peer directory with a fixed per-channel occupancy limit.
///
/// The limit bounds this node's gossip fan-out per channel; a peer that
/// cannot be admitted under any matching channel is rejected outright.
#[derive(Debug)]
pub struct RemotePeerStorage {
    peers: HashMap<NodeId, RemotePeer>,
    peer_ids_by_channel: HashMap<ChainId, Vec<NodeId>>,
    channel_order: Vec<ChainId>,
    channel_limit: usize,
}

impl RemotePeerStorage {
    /// An empty directory with the given per-channel limit.
    pub fn new(channel_limit: usize) -> Self {
        Self {
            peers: HashMap::new(),
            peer_ids_by_channel: HashMap::new(),
            channel_order: Vec::new(),
            channel_limit,
        }
    }

    /// Whether a peer id is registered.
    pub fn has_peer(&self, peer_id: NodeId) -> bool {
        self.peers.contains_key(&peer_id)
    }

    /// Try to register a remote peer.
    ///
    /// For every channel this node tracks that the remote also claims: an
    /// already-registered peer is updated in place; a new peer is admitted
    /// while the channel is below its limit. A peer that matches no tracked
    /// channel, or only full ones, is rejected.
    pub fn add_peer(&mut self, remote: RemotePeer) -> PeerAddResult {
        let mut result = PeerAddResult::Rejected;

        for channel in self.channel_order.clone() {
            if !remote.channels.contains(&channel) {
                continue;
            }

            let ids = self.peer_ids_by_channel.entry(channel).or_default();
            if ids.contains(&remote.id) {
                result = PeerAddResult::Updated;
                self.peers.insert(remote.id, remote.clone());
            } else if ids.len() < self.channel_limit {
                if result != PeerAddResult::Updated {
                    result = PeerAddResult::Added;
                }
                ids.push(remote.id);
                self.peers.insert(remote.id, remote.clone());
            }
        }

        result
    }

    /// Deregister a peer from every channel.
    pub fn remove_peer(&mut self, peer_id: NodeId) {
        for ids in self.peer_ids_by_channel.values_mut() {
            ids.retain(|id| *id != peer_id);
        }
        self.peers.remove(&peer_id);
    }

    /// Peers registered under one channel.
    pub fn peers_by_channel(&self, channel: &str) -> Vec<RemotePeer> {
        self.peer_ids_by_channel
            .get(channel)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| self.peers.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every registered peer.
    pub fn all_peers(&self) -> Vec<RemotePeer> {
        self.peers.values().cloned().collect()
    }

    /// Start tracking a channel.
    pub fn add_channel(&mut self, channel: &str) {
        if !self.channel_order.iter().any(|c| c == channel) {
            self.channel_order.push(channel.to_string());
            self.peer_ids_by_channel
                .insert(channel.to_string(), Vec::new());
        }
    }

    /// Tracked channels, in subscription order.
    pub fn channels(&self) -> &[ChainId] {
        &self.channel_order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(id: NodeId, channels: &[&str]) -> RemotePeer {
        let (tx, _rx) = mpsc::unbounded_channel();
        RemotePeer {
            id,
            channels: channels.iter().map(|c| c.to_string()).collect(),
            host: "127.0.0.1".to_string(),
            port: 7000 + id as u16,
            handle: ConnectionHandle::new(tx),
        }
    }

    #[test]
    fn test_add_peer_on_matching_channel() {
        let mut storage = RemotePeerStorage::new(10);
        storage.add_channel("shard_1");

        assert_eq!(storage.add_peer(remote(11, &["shard_1"])), PeerAddResult::Added);
        assert!(storage.has_peer(11));
        assert_eq!(storage.peers_by_channel("shard_1").len(), 1);
    }

    #[test]
    fn test_re_adding_is_an_update() {
        let mut storage = RemotePeerStorage::new(10);
        storage.add_channel("shard_1");
        storage.add_peer(remote(11, &["shard_1"]));

        let refreshed = remote(11, &["shard_1"]);
        assert_eq!(storage.add_peer(refreshed), PeerAddResult::Updated);
        assert_eq!(storage.peers_by_channel("shard_1").len(), 1);
    }

    #[test]
    fn test_no_shared_channel_is_rejected() {
        let mut storage = RemotePeerStorage::new(10);
        storage.add_channel("shard_1");

        assert_eq!(
            storage.add_peer(remote(21, &["shard_2"])),
            PeerAddResult::Rejected
        );
        assert!(!storage.has_peer(21));
    }

    #[test]
    fn test_full_channel_rejects_new_peer() {
        let mut storage = RemotePeerStorage::new(2);
        storage.add_channel("shard_1");
        assert_eq!(storage.add_peer(remote(11, &["shard_1"])), PeerAddResult::Added);
        assert_eq!(storage.add_peer(remote(12, &["shard_1"])), PeerAddResult::Added);

        assert_eq!(
            storage.add_peer(remote(13, &["shard_1"])),
            PeerAddResult::Rejected
        );
        // But a registered peer still updates at capacity.
        assert_eq!(
            storage.add_peer(remote(12, &["shard_1"])),
            PeerAddResult::Updated
        );
    }

    #[test]
    fn test_remove_peer_clears_every_channel() {
        let mut storage = RemotePeerStorage::new(10);
        storage.add_channel("shard_1");
        storage.add_channel("basechain");
        storage.add_peer(remote(11, &["shard_1", "basechain"]));

        storage.remove_peer(11);
        assert!(!storage.has_peer(11));
        assert!(storage.peers_by_channel("shard_1").is_empty());
        assert!(storage.peers_by_channel("basechain").is_empty());
    }

    #[test]
    fn test_channel_scoping() {
        let mut storage = RemotePeerStorage::new(10);
        storage.add_channel("shard_1");
        storage.add_channel("shard_2");
        storage.add_peer(remote(11, &["shard_1"]));
        storage.add_peer(remote(21, &["shard_2"]));

        let shard_1_ids: Vec<NodeId> = storage
            .peers_by_channel("shard_1")
            .iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(shard_1_ids, vec![11]);
        assert!(storage.peers_by_channel("unknown").is_empty());
        assert_eq!(storage.all_peers().len(), 2);
    }
}
