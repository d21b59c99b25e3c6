//! In-process transport medium.
//!
//! Real socket plumbing (TCP/QUIC dial, handshake) has no counterpart
//! anywhere in this codebase to generalize from; the only prior art is a
//! `connect()` that returned "not implemented". Rather than carry that
//! placeholder forward, nodes that share an [`InProcessNetwork`] exchange
//! encoded envelopes over in-memory channels keyed by [`NodeId`], giving
//! Transport a real (if single-process) medium to dial, send over, and test
//! against.

use bytes::Bytes;
use dashmap::DashMap;
use neuromesh_core::NodeId;
use std::sync::Arc;
use tokio::sync::mpsc;

/// A shared registry of node inboxes. Cloning a handle is cheap; all clones
/// address the same set of registered nodes.
#[derive(Clone, Default)]
pub struct InProcessNetwork {
    inboxes: Arc<DashMap<NodeId, mpsc::Sender<Bytes>>>,
}

impl InProcessNetwork {
    /// Creates an empty network with no registered nodes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `node_id` and returns the receiving half of its inbox.
    /// Re-registering an id replaces its previous inbox, dropping the old
    /// sender so any queued receiver for it simply stops yielding items.
    pub(crate) fn register(&self, node_id: NodeId, buffer: usize) -> mpsc::Receiver<Bytes> {
        let (tx, rx) = mpsc::channel(buffer);
        self.inboxes.insert(node_id, tx);
        rx
    }

    /// Removes `node_id`'s inbox, if present.
    pub(crate) fn deregister(&self, node_id: NodeId) {
        self.inboxes.remove(&node_id);
    }

    /// Returns true if `node_id` currently has a registered inbox.
    #[must_use]
    pub fn is_reachable(&self, node_id: NodeId) -> bool {
        self.inboxes.contains_key(&node_id)
    }

    /// Attempts to enqueue `bytes` for `node_id` without waiting.
    ///
    /// Returns `Ok(())` on success, `Err(true)` if the peer's inbox is full
    /// (backpressure), and `Err(false)` if the peer is not registered.
    pub(crate) fn try_send(&self, node_id: NodeId, bytes: Bytes) -> Result<(), bool> {
        match self.inboxes.get(&node_id) {
            Some(sender) => sender.try_send(bytes).map_err(|err| match err {
                mpsc::error::TrySendError::Full(_) => true,
                mpsc::error::TrySendError::Closed(_) => false,
            }),
            None => Err(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(seed: u8) -> NodeId {
        use neuromesh_core::id::RawId;
        NodeId::from_raw(RawId::from_bytes([seed; 16]))
    }

    #[tokio::test]
    async fn registered_node_receives_sent_bytes() {
        let network = InProcessNetwork::new();
        let a = node(1);
        let mut rx = network.register(a, 4);
        network.try_send(a, Bytes::from_static(b"hello")).unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(&received[..], b"hello");
    }

    #[test]
    fn unknown_node_is_unreachable() {
        let network = InProcessNetwork::new();
        assert!(!network.is_reachable(node(9)));
        assert_eq!(network.try_send(node(9), Bytes::new()), Err(false));
    }

    #[test]
    fn deregister_makes_node_unreachable() {
        let network = InProcessNetwork::new();
        let a = node(3);
        let _rx = network.register(a, 4);
        assert!(network.is_reachable(a));
        network.deregister(a);
        assert!(!network.is_reachable(a));
    }
}
