//! Transport-owned session state: reachability, throughput, and latency.
//!
//! Kept distinct from [`crate::Peer`] per the wire data model: `Connection`
//! is owned exclusively by [`crate::Transport`] and only ever referenced
//! (never mutated) by Topology.

use neuromesh_core::{NodeId, Timestamp};
use serde::{Deserialize, Serialize};

/// The lifecycle state of one peer session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    /// `connect` is in progress; the peer has not yet become reachable.
    Connecting,
    /// A bidirectional channel is open.
    Connected,
    /// The session is being torn down.
    Closing,
    /// The session failed: a connect deadline lapsed or the peer stopped
    /// being reachable while connected.
    Failed,
}

/// Reachability and throughput bookkeeping for one peer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    /// The peer this connection is to.
    pub peer_id: NodeId,
    /// Current session state.
    pub state: ConnectionState,
    /// Last measured round-trip latency in milliseconds, if any.
    pub latency_ms: Option<u64>,
    /// Most recently estimated throughput, in bits per second.
    pub bandwidth_bps: u64,
    /// Messages sent to this peer since the session opened.
    pub sent: u64,
    /// Messages received from this peer since the session opened.
    pub received: u64,
    /// Total payload bytes exchanged (both directions) since the session opened.
    pub bytes: u64,
    /// When this connection last sent, received, or changed state.
    pub last_activity: Timestamp,
}

impl Connection {
    /// Creates a new connection to `peer_id` in the `Connecting` state.
    #[must_use]
    pub fn new(peer_id: NodeId) -> Self {
        Self {
            peer_id,
            state: ConnectionState::Connecting,
            latency_ms: None,
            bandwidth_bps: 0,
            sent: 0,
            received: 0,
            bytes: 0,
            last_activity: Timestamp::now(),
        }
    }

    /// Marks the connection as open.
    pub fn mark_connected(&mut self) {
        self.state = ConnectionState::Connected;
        self.last_activity = Timestamp::now();
    }

    /// Marks the connection as being closed down cleanly.
    pub fn mark_closing(&mut self) {
        self.state = ConnectionState::Closing;
        self.last_activity = Timestamp::now();
    }

    /// Marks the connection as failed (connect timeout, or the peer dropped
    /// off the network while connected).
    pub fn mark_failed(&mut self) {
        self.state = ConnectionState::Failed;
        self.last_activity = Timestamp::now();
    }

    /// Records an outbound message of `len` bytes.
    pub fn record_sent(&mut self, len: usize) {
        self.sent += 1;
        self.bytes += len as u64;
        self.last_activity = Timestamp::now();
    }

    /// Records an inbound message of `len` bytes.
    pub fn record_received(&mut self, len: usize) {
        self.received += 1;
        self.bytes += len as u64;
        self.last_activity = Timestamp::now();
    }

    /// Updates the last-measured round-trip latency.
    pub fn touch_latency(&mut self, latency_ms: u64) {
        self.latency_ms = Some(latency_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_core::NodeId;

    fn id() -> NodeId {
        NodeId::from_public_key_bytes(&[7u8; 32])
    }

    #[test]
    fn starts_connecting_and_transitions_to_connected() {
        let mut connection = Connection::new(id());
        assert_eq!(connection.state, ConnectionState::Connecting);
        connection.mark_connected();
        assert_eq!(connection.state, ConnectionState::Connected);
    }

    #[test]
    fn counters_accumulate_independently() {
        let mut connection = Connection::new(id());
        connection.record_sent(10);
        connection.record_received(20);
        assert_eq!(connection.sent, 1);
        assert_eq!(connection.received, 1);
        assert_eq!(connection.bytes, 30);
    }

    #[test]
    fn failed_is_distinct_from_closing() {
        let mut connection = Connection::new(id());
        connection.mark_closing();
        assert_eq!(connection.state, ConnectionState::Closing);
        connection.mark_failed();
        assert_eq!(connection.state, ConnectionState::Failed);
    }
}
