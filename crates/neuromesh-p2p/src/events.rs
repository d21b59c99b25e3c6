//! Transport-level events surfaced to higher layers.

use neuromesh_core::NodeId;

/// A connection-lifecycle or dispatch event raised by [`crate::Transport`].
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// `connect` succeeded.
    PeerConnected(NodeId),
    /// A session ended, with a human-readable reason.
    PeerDisconnected {
        /// The peer that disconnected.
        peer_id: NodeId,
        /// Why the session ended.
        reason: String,
    },
    /// A `broadcast` fanout to one peer failed; the overall call still succeeded.
    BroadcastFailed {
        /// The peer the fanout attempt targeted.
        peer_id: NodeId,
        /// Why the send failed.
        reason: String,
    },
}
