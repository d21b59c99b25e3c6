//! Transport configuration.

use std::time::Duration;

/// Tunables for a [`crate::Transport`] instance.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// How long `connect` waits for a peer to become reachable.
    pub connection_timeout: Duration,
    /// How often the node broadcasts a heartbeat.
    pub heartbeat_interval: Duration,
    /// A peer whose `last_seen` exceeds this is a partition candidate
    /// (consumed by Topology, tracked here for `Peer::is_stale`).
    pub stale_threshold: Duration,
    /// Outbound per-peer buffer capacity before `send` fails `WouldBlock`.
    pub send_buffer: usize,
    /// How long a `(source, id)` broadcast dedup entry is retained.
    pub dedup_retention: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(10),
            stale_threshold: Duration::from_secs(30),
            send_buffer: 256,
            dedup_retention: Duration::from_secs(120),
        }
    }
}
