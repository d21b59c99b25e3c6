//! The Transport subsystem: peer sessions, heartbeats, and message dispatch.

use crate::{
    dedup::DedupCache, sink::MessageSink, Connection, InProcessNetwork, P2pError, Peer, Result,
    TransportConfig, TransportEvent,
};
use dashmap::DashMap;
use neuromesh_core::{AgentId, NodeId};
use neuromesh_identity::Keypair;
use neuromesh_protocol::{Message, MessageKind};
use parking_lot::{Mutex, RwLock};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

struct Session {
    peer: Peer,
    connection: Connection,
    outbox_full_since: Option<neuromesh_core::Timestamp>,
}

/// Peer sessions, heartbeating, and message dispatch for one mesh node.
///
/// Heartbeat and dispatch are handled internally; `AgentCoordination`,
/// `Consensus`, and `NeuralSync` messages (and, after Transport's own
/// bookkeeping, `Direct`/`Broadcast` payloads too) are forwarded to the
/// configured [`MessageSink`] so the Agent Manager, Consensus Engine, and
/// Coordinator can consume them without Transport knowing their shapes.
pub struct Transport {
    node_id: NodeId,
    keypair: Keypair,
    config: TransportConfig,
    network: InProcessNetwork,
    sessions: DashMap<NodeId, Session>,
    dedup: Mutex<DedupCache>,
    local_agent_ids: RwLock<Vec<AgentId>>,
    resource_usage: RwLock<(f64, f64)>,
    capabilities: Vec<String>,
    sink: Arc<dyn MessageSink>,
    events_tx: mpsc::UnboundedSender<TransportEvent>,
}

impl Transport {
    /// Builds a Transport bound to `keypair`'s node id and registers it on
    /// `network`. Returns the Transport and a stream of lifecycle/dispatch
    /// events; callers should spawn [`Transport::run`] to start heartbeating
    /// and receiving.
    #[must_use]
    pub fn new(
        keypair: Keypair,
        config: TransportConfig,
        network: InProcessNetwork,
        capabilities: Vec<String>,
        sink: Arc<dyn MessageSink>,
    ) -> (Arc<Self>, mpsc::Receiver<bytes::Bytes>, mpsc::UnboundedReceiver<TransportEvent>) {
        let node_id = NodeId::from_public_key_bytes(keypair.public_key().as_bytes());
        let inbox = network.register(node_id, config.send_buffer);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let dedup = Mutex::new(DedupCache::new(config.dedup_retention));
        let transport = Arc::new(Self {
            node_id,
            keypair,
            config,
            network,
            sessions: DashMap::new(),
            dedup,
            local_agent_ids: RwLock::new(Vec::new()),
            resource_usage: RwLock::new((0.0, 0.0)),
            capabilities,
            sink,
            events_tx,
        });
        (transport, inbox, events_rx)
    }

    /// This node's id.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Records this node's own resource utilization, self-reported in every
    /// heartbeat from this point on so peers can weigh it in adaptive
    /// selection. Both values are clamped to `[0, 1]`.
    pub fn set_resource_usage(&self, cpu_usage: f64, mem_usage: f64) {
        *self.resource_usage.write() = (cpu_usage.clamp(0.0, 1.0), mem_usage.clamp(0.0, 1.0));
    }

    /// Records the agent ids hosted locally, advertised in future heartbeats.
    pub fn set_local_agent_ids(&self, agent_ids: Vec<AgentId>) {
        *self.local_agent_ids.write() = agent_ids;
    }

    /// Spawns the heartbeat loop and the inbox receive loop. Returns their
    /// join handles so callers may await or abort them.
    pub fn run(self: &Arc<Self>, inbox: mpsc::Receiver<bytes::Bytes>) -> Vec<tokio::task::JoinHandle<()>> {
        let heartbeat = tokio::spawn(Arc::clone(self).heartbeat_loop());
        let receive = tokio::spawn(Arc::clone(self).receive_loop(inbox));
        vec![heartbeat, receive]
    }

    /// Opens a session to `peer_id` at `address` with the given public key.
    ///
    /// # Errors
    ///
    /// Returns [`P2pError::Unreachable`] if the peer has no inbox registered
    /// on the shared network within `connection_timeout`.
    pub async fn connect(
        &self,
        address: SocketAddr,
        public_key: neuromesh_identity::PublicKey,
    ) -> Result<NodeId> {
        let peer_id = NodeId::from_public_key_bytes(public_key.as_bytes());
        let peer = Peer::new(address, public_key);
        self.sessions.insert(
            peer_id,
            Session {
                peer,
                connection: Connection::new(peer_id),
                outbox_full_since: None,
            },
        );

        let deadline = tokio::time::Instant::now() + self.config.connection_timeout;
        loop {
            if self.network.is_reachable(peer_id) {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                if let Some(mut session) = self.sessions.get_mut(&peer_id) {
                    session.connection.mark_failed();
                }
                return Err(P2pError::Unreachable(peer_id));
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        if let Some(mut session) = self.sessions.get_mut(&peer_id) {
            session.connection.mark_connected();
        }
        let _ = self.events_tx.send(TransportEvent::PeerConnected(peer_id));
        Ok(peer_id)
    }

    /// Closes the session to `peer_id`, if any.
    pub fn close(&self, peer_id: NodeId, reason: impl Into<String>) {
        if self.sessions.remove(&peer_id).is_some() {
            let _ = self.events_tx.send(TransportEvent::PeerDisconnected {
                peer_id,
                reason: reason.into(),
            });
        }
    }

    /// Returns a snapshot of the currently known peer sessions.
    #[must_use]
    pub fn peers(&self) -> Vec<Peer> {
        self.sessions.iter().map(|entry| entry.peer.clone()).collect()
    }

    /// Returns a snapshot of the currently known peer sessions together with
    /// their connection state, for callers (Topology) that need both.
    #[must_use]
    pub fn peers_with_connections(&self) -> Vec<(Peer, Connection)> {
        self.sessions
            .iter()
            .map(|entry| (entry.peer.clone(), entry.connection.clone()))
            .collect()
    }

    /// Sends `message` to the single peer named by `message.destination`.
    ///
    /// # Errors
    ///
    /// Returns [`P2pError::NotConnected`] if there is no open session to the
    /// destination, or [`P2pError::WouldBlock`] if its inbox is saturated.
    pub async fn send(&self, mut message: Message) -> Result<()> {
        let peer_id = message
            .destination
            .ok_or_else(|| P2pError::NotConnected(message.source))?;
        if self.sessions.get(&peer_id).is_none() {
            return Err(P2pError::NotConnected(peer_id));
        }
        message.source = self.node_id;
        let bytes = message.encode()?;
        let len = bytes.len();
        match self.network.try_send(peer_id, bytes) {
            Ok(()) => {
                if let Some(mut session) = self.sessions.get_mut(&peer_id) {
                    session.connection.record_sent(len);
                    session.outbox_full_since = None;
                }
                Ok(())
            }
            Err(true) => Err(P2pError::WouldBlock(peer_id)),
            Err(false) => Err(P2pError::NotConnected(peer_id)),
        }
    }

    /// Fans `message` out to every connected peer, best-effort. Failures are
    /// surfaced as [`TransportEvent::BroadcastFailed`] rather than returned,
    /// since a partial broadcast is still a successful broadcast.
    pub async fn broadcast(&self, mut message: Message) {
        message.source = self.node_id;
        message.kind = MessageKind::Broadcast;
        self.dedup.lock().insert_if_new(message.source, message.id);
        self.fanout(&message).await;
    }

    async fn fanout(&self, message: &Message) {
        let peer_ids: Vec<NodeId> = self.sessions.iter().map(|entry| *entry.key()).collect();
        for peer_id in peer_ids {
            let bytes = match message.encode() {
                Ok(bytes) => bytes,
                Err(err) => {
                    tracing::warn!(error = %err, "failed to encode outgoing broadcast");
                    return;
                }
            };
            let len = bytes.len();
            match self.network.try_send(peer_id, bytes) {
                Ok(()) => {
                    if let Some(mut session) = self.sessions.get_mut(&peer_id) {
                        session.connection.record_sent(len);
                    }
                }
                Err(full) => {
                    if let Some(mut session) = self.sessions.get_mut(&peer_id) {
                        if !full {
                            session.connection.mark_failed();
                        }
                    }
                    let reason = if full {
                        "peer inbox full".to_string()
                    } else {
                        "peer no longer reachable".to_string()
                    };
                    let _ = self
                        .events_tx
                        .send(TransportEvent::BroadcastFailed { peer_id, reason });
                }
            }
        }
    }

    async fn heartbeat_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.config.heartbeat_interval);
        loop {
            interval.tick().await;
            let (cpu_usage, mem_usage) = *self.resource_usage.read();
            let payload = serde_json::json!({
                "capabilities": self.capabilities,
                "agent_ids": self
                    .local_agent_ids
                    .read()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
                "cpu_usage": cpu_usage,
                "mem_usage": mem_usage,
            });
            let message = Message::heartbeat(self.node_id, payload);
            self.broadcast(message).await;
        }
    }

    async fn receive_loop(self: Arc<Self>, mut inbox: mpsc::Receiver<bytes::Bytes>) {
        while let Some(bytes) = inbox.recv().await {
            let len = bytes.len();
            match Message::decode(bytes) {
                Ok(message) => self.handle_message(message, len).await,
                Err(err) => tracing::warn!(error = %err, "dropping undecodable envelope"),
            }
        }
    }

    async fn handle_message(self: &Arc<Self>, message: Message, len: usize) {
        if let Some(mut session) = self.sessions.get_mut(&message.source) {
            session.peer.last_seen = neuromesh_core::Timestamp::now();
            session.connection.record_received(len);
        }

        match message.kind {
            MessageKind::Heartbeat => self.handle_heartbeat(&message),
            MessageKind::Broadcast => {
                self.maybe_rebroadcast(&message).await;
                self.sink.handle(message.source, message);
            }
            MessageKind::Direct
            | MessageKind::AgentCoordination
            | MessageKind::Consensus
            | MessageKind::NeuralSync => {
                self.sink.handle(message.source, message);
            }
        }
    }

    fn handle_heartbeat(&self, message: &Message) {
        let Some(mut session) = self.sessions.get_mut(&message.source) else {
            return;
        };
        let capabilities = message
            .payload
            .get("capabilities")
            .and_then(|value| value.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default();
        let agent_ids = message
            .payload
            .get("agent_ids")
            .and_then(|value| value.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| item.as_str())
                    .filter_map(|id| id.parse::<AgentId>().ok())
                    .collect()
            })
            .unwrap_or_default();
        let cpu_usage = message.payload.get("cpu_usage").and_then(serde_json::Value::as_f64).unwrap_or(0.0);
        let mem_usage = message.payload.get("mem_usage").and_then(serde_json::Value::as_f64).unwrap_or(0.0);
        session.peer.touch(capabilities, agent_ids, cpu_usage, mem_usage);
    }

    /// Rebroadcasts a forwarded message exactly once per `(source, id)`, and
    /// only while there is hop budget left after incrementing: `hop + 1 < ttl`.
    async fn maybe_rebroadcast(self: &Arc<Self>, message: &Message) {
        let (source, id) = message.dedup_key();
        let is_new = self.dedup.lock().insert_if_new(source, id);
        if !is_new || message.hop + 1 >= message.ttl {
            return;
        }
        let forwarded = message.forwarded();
        self.fanout(&forwarded).await;
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.network.deregister(self.node_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::NullSink;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink {
        count: AtomicUsize,
    }

    impl MessageSink for CountingSink {
        fn handle(&self, _from: NodeId, _message: Message) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    async fn build(network: &InProcessNetwork, seed: u64) -> (Arc<Transport>, mpsc::Receiver<bytes::Bytes>) {
        let keypair = Keypair::from_seed(seed);
        let mut config = TransportConfig::default();
        config.heartbeat_interval = std::time::Duration::from_secs(3600);
        let (transport, inbox, _events) = Transport::new(
            keypair,
            config,
            network.clone(),
            vec!["inference".to_string()],
            Arc::new(NullSink),
        );
        (transport, inbox)
    }

    #[tokio::test]
    async fn connect_times_out_on_unknown_peer() {
        let network = InProcessNetwork::new();
        let (transport, _inbox) = build(&network, 1).await;
        let mut config = TransportConfig::default();
        config.connection_timeout = std::time::Duration::from_millis(20);
        let keypair = Keypair::from_seed(2);
        let public_key = keypair.public_key();
        let result = tokio::time::timeout(
            std::time::Duration::from_secs(1),
            transport.connect(addr(9001), public_key),
        )
        .await
        .unwrap();
        assert!(matches!(result, Err(P2pError::Unreachable(_))));
    }

    #[tokio::test]
    async fn direct_message_reaches_sink() {
        let network = InProcessNetwork::new();
        let keypair_a = Keypair::from_seed(10);
        let keypair_b = Keypair::from_seed(11);

        let mut config = TransportConfig::default();
        config.heartbeat_interval = std::time::Duration::from_secs(3600);
        let sink_b = Arc::new(CountingSink {
            count: AtomicUsize::new(0),
        });
        let (transport_a, inbox_a, _events_a) = Transport::new(
            keypair_a.clone(),
            config.clone(),
            network.clone(),
            vec![],
            Arc::new(NullSink),
        );
        let (transport_b, inbox_b, _events_b) = Transport::new(
            keypair_b.clone(),
            config,
            network.clone(),
            vec![],
            sink_b.clone(),
        );
        transport_a.run(inbox_a);
        transport_b.run(inbox_b);

        let node_b = transport_a
            .connect(addr(9100), keypair_b.public_key())
            .await
            .unwrap();
        transport_b
            .connect(addr(9101), keypair_a.public_key())
            .await
            .unwrap();

        let message = Message::new(
            transport_a.node_id(),
            Some(node_b),
            MessageKind::Direct,
            serde_json::json!({"hello": true}),
            1,
        );
        transport_a.send(message).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert_eq!(sink_b.count.load(Ordering::SeqCst), 1);

        let connections = transport_a.peers_with_connections();
        let (_, connection) = connections.iter().find(|(peer, _)| peer.id == node_b).unwrap();
        assert_eq!(connection.sent, 1);
        assert_eq!(connection.state, crate::ConnectionState::Connected);
    }

    #[tokio::test]
    async fn heartbeat_carries_self_reported_resource_usage() {
        let network = InProcessNetwork::new();
        let keypair_a = Keypair::from_seed(30);
        let keypair_b = Keypair::from_seed(31);

        let mut config = TransportConfig::default();
        config.heartbeat_interval = std::time::Duration::from_millis(10);
        let (transport_a, inbox_a, _events_a) = Transport::new(
            keypair_a.clone(),
            config.clone(),
            network.clone(),
            vec![],
            Arc::new(NullSink),
        );
        let (transport_b, inbox_b, _events_b) = Transport::new(
            keypair_b.clone(),
            config,
            network.clone(),
            vec![],
            Arc::new(NullSink),
        );
        transport_a.set_resource_usage(0.7, 0.4);
        transport_a.run(inbox_a);
        transport_b.run(inbox_b);

        let node_a = transport_b
            .connect(addr(9200), keypair_a.public_key())
            .await
            .unwrap();
        transport_a
            .connect(addr(9201), keypair_b.public_key())
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let peer_a = transport_b.peers().into_iter().find(|p| p.id == node_a).unwrap();
        assert!(peer_a.cpu_usage > 0.0);
        assert!(peer_a.mem_usage > 0.0);
    }

    #[tokio::test]
    async fn send_without_session_is_not_connected() {
        let network = InProcessNetwork::new();
        let (transport, inbox) = build(&network, 20).await;
        transport.run(inbox);
        let message = Message::new(
            transport.node_id(),
            Some(NodeId::generate()),
            MessageKind::Direct,
            serde_json::json!({}),
            1,
        );
        let result = transport.send(message).await;
        assert!(matches!(result, Err(P2pError::NotConnected(_))));
    }
}
