//! Per-peer telemetry used by selection, scoring, and rebalancing.

use neuromesh_core::{NodeId, Timestamp};
use std::time::Duration;

/// What Topology knows about one known peer, merging Transport session data
/// (latency, message counts, last-seen) with resource telemetry that
/// Transport does not track (cpu/memory utilization, hosted agent count).
#[derive(Debug, Clone)]
pub struct CandidateInfo {
    /// The peer's node id.
    pub node_id: NodeId,
    /// Measured round-trip latency, if any has been observed.
    pub latency: Option<Duration>,
    /// CPU utilization in `[0, 1]`, most recently reported.
    pub cpu_usage: f64,
    /// Memory utilization in `[0, 1]`, most recently reported.
    pub mem_usage: f64,
    /// Number of agents the peer last advertised hosting.
    pub agent_count: usize,
    /// Current degree (number of connections) the peer is known to have.
    pub degree: usize,
    /// Messages exchanged with this peer since the session opened.
    pub message_count: u64,
    /// When this peer was last heard from.
    pub last_seen: Timestamp,
    /// Whether a session to this peer is currently open.
    pub connected: bool,
}

impl CandidateInfo {
    /// Builds a `CandidateInfo` from a Transport [`neuromesh_p2p::Peer`] and
    /// its [`neuromesh_p2p::Connection`]: identity/resource telemetry comes
    /// from the former (self-reported in heartbeats), session/throughput
    /// state from the latter.
    #[must_use]
    pub fn from_peer(peer: &neuromesh_p2p::Peer, connection: &neuromesh_p2p::Connection, degree: usize) -> Self {
        Self {
            node_id: peer.id,
            latency: connection.latency_ms.map(Duration::from_millis),
            cpu_usage: peer.cpu_usage,
            mem_usage: peer.mem_usage,
            agent_count: peer.agent_ids.len(),
            degree,
            message_count: connection.sent + connection.received,
            last_seen: peer.last_seen,
            connected: matches!(connection.state, neuromesh_p2p::ConnectionState::Connected),
        }
    }

    fn latency_secs(&self) -> f64 {
        self.latency.map_or(1.0, |d| d.as_secs_f64())
    }

    /// The adaptive-mode score: `1/(latency+1) + (1-cpu) + (1-mem) + 0.1*agent_count`.
    #[must_use]
    pub fn adaptive_score(&self) -> f64 {
        1.0 / (self.latency_secs() + 1.0)
            + (1.0 - self.cpu_usage.clamp(0.0, 1.0))
            + (1.0 - self.mem_usage.clamp(0.0, 1.0))
            + 0.1 * self.agent_count as f64
    }

    /// The rebalancing retention score: `1/(latency+1) + messages/100 - minutes_since_last_activity`.
    #[must_use]
    pub fn retention_score(&self, now: Timestamp) -> f64 {
        let minutes_idle = self.last_seen.elapsed_until(now).as_secs_f64() / 60.0;
        1.0 / (self.latency_secs() + 1.0) + (self.message_count as f64 / 100.0) - minutes_idle
    }
}
