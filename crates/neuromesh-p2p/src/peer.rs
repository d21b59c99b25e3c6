//! Peer identity and capability bookkeeping.

use neuromesh_core::{AgentId, NodeId, Timestamp};
use neuromesh_identity::PublicKey;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Identity and advertised capabilities of a peer. Session/transport state
/// (connectedness, latency, throughput counters) lives on [`crate::Connection`]
/// instead — a `Peer` is who they are, a `Connection` is how reachable they
/// currently are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Peer {
    /// The peer's node id, derived from its public key.
    pub id: NodeId,
    /// The peer's address.
    pub address: SocketAddr,
    /// The peer's public key.
    pub public_key: PublicKey,
    /// When this session was first created.
    pub connected_at: Timestamp,
    /// When we last heard from this peer (heartbeat or any message).
    pub last_seen: Timestamp,
    /// Capabilities advertised in the peer's most recent heartbeat.
    pub capabilities: Vec<String>,
    /// Agent ids the peer last reported hosting.
    pub agent_ids: Vec<AgentId>,
    /// CPU utilization in `[0, 1]` the peer self-reported in its most recent heartbeat.
    pub cpu_usage: f64,
    /// Memory utilization in `[0, 1]` the peer self-reported in its most recent heartbeat.
    pub mem_usage: f64,
}

impl Peer {
    /// Creates a peer identity record.
    #[must_use]
    pub fn new(address: SocketAddr, public_key: PublicKey) -> Self {
        let now = Timestamp::now();
        Self {
            id: NodeId::from_public_key_bytes(public_key.as_bytes()),
            address,
            public_key,
            connected_at: now,
            last_seen: now,
            capabilities: Vec::new(),
            agent_ids: Vec::new(),
            cpu_usage: 0.0,
            mem_usage: 0.0,
        }
    }

    /// Updates the last-seen timestamp and the values advertised in a heartbeat.
    pub fn touch(
        &mut self,
        capabilities: Vec<String>,
        agent_ids: Vec<AgentId>,
        cpu_usage: f64,
        mem_usage: f64,
    ) {
        self.last_seen = Timestamp::now();
        self.capabilities = capabilities;
        self.agent_ids = agent_ids;
        self.cpu_usage = cpu_usage.clamp(0.0, 1.0);
        self.mem_usage = mem_usage.clamp(0.0, 1.0);
    }

    /// Returns true if `last_seen` is older than `stale_threshold`.
    #[must_use]
    pub fn is_stale(&self, stale_threshold: std::time::Duration) -> bool {
        self.last_seen.elapsed_until(Timestamp::now()) > stale_threshold
    }
}
