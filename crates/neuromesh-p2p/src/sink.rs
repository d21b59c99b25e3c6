//! The dispatch target for messages Transport does not handle itself.

use neuromesh_core::NodeId;
use neuromesh_protocol::Message;

/// Receives messages whose kind routes outside Transport: agent-coordination
/// to the Agent Manager, consensus to the Consensus Engine, neural-sync to
/// the Coordinator, and (after Transport's own bookkeeping) direct/broadcast
/// application payloads back to whichever caller is listening.
pub trait MessageSink: Send + Sync {
    /// Handles one dispatched message, originating from `from`.
    fn handle(&self, from: NodeId, message: Message);
}

/// A `MessageSink` that discards everything; useful for tests and for nodes
/// that only participate in heartbeats/topology.
pub struct NullSink;

impl MessageSink for NullSink {
    fn handle(&self, _from: NodeId, _message: Message) {}
}
