//! The canonical wire envelope.

use crate::{ProtocolError, Result, MAGIC, MAX_MESSAGE_SIZE};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use neuromesh_core::{MessageId, NodeId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of a wire message, dispatched to a different subsystem by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    /// Liveness/capability announcement, handled by Transport/Topology.
    Heartbeat = 0,
    /// Point-to-point message addressed to a single peer.
    Direct = 1,
    /// Fanout message to all connected peers.
    Broadcast = 2,
    /// Agent lifecycle coordination (spawn/terminate/task-assign/...), routed to the Agent Manager.
    AgentCoordination = 3,
    /// Cross-node neural sync (inference broadcast, weight sync), routed to the Coordinator.
    NeuralSync = 4,
    /// Consensus proposal/vote/commit/abort, routed to the Consensus Engine.
    Consensus = 5,
}

impl MessageKind {
    const fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Heartbeat),
            1 => Some(Self::Direct),
            2 => Some(Self::Broadcast),
            3 => Some(Self::AgentCoordination),
            4 => Some(Self::NeuralSync),
            5 => Some(Self::Consensus),
            _ => None,
        }
    }
}

/// A type-specific message payload. Left as an opaque JSON value at this layer
/// so that `neuromesh-protocol` has no dependency on the agent/consensus crates
/// that define the concrete payload shapes; callers deserialize `payload` further
/// once `kind` has told them which type to expect.
pub type MessagePayload = Value;

/// The canonical wire envelope exchanged between nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique id, assigned by the source node.
    pub id: MessageId,
    /// Milliseconds since the Unix epoch, assigned by the source node.
    pub timestamp: Timestamp,
    /// The originating node.
    pub source: NodeId,
    /// The destination node; absent for broadcasts.
    pub destination: Option<NodeId>,
    /// The message kind, used for dispatch.
    pub kind: MessageKind,
    /// The kind-specific payload.
    pub payload: MessagePayload,
    /// Number of hops this message has traversed so far.
    pub hop: u8,
    /// Maximum number of hops this message may traverse.
    pub ttl: u8,
}

impl Message {
    /// Creates a new envelope from `source`, defaulting `hop` to 0.
    #[must_use]
    pub fn new(
        source: NodeId,
        destination: Option<NodeId>,
        kind: MessageKind,
        payload: MessagePayload,
        ttl: u8,
    ) -> Self {
        Self {
            id: MessageId::generate(),
            timestamp: Timestamp::now(),
            source,
            destination,
            kind,
            payload,
            hop: 0,
            ttl,
        }
    }

    /// Creates a heartbeat message.
    #[must_use]
    pub fn heartbeat(source: NodeId, payload: MessagePayload) -> Self {
        Self::new(source, None, MessageKind::Heartbeat, payload, 1)
    }

    /// Returns true if this message may still be forwarded (`hop < ttl`).
    #[must_use]
    pub const fn can_forward(&self) -> bool {
        self.hop < self.ttl
    }

    /// Returns a copy of this message with `hop` incremented by one, for rebroadcast.
    ///
    /// # Panics
    ///
    /// Panics if `can_forward()` is false; callers must check first.
    #[must_use]
    pub fn forwarded(&self) -> Self {
        assert!(self.can_forward(), "message ttl exceeded");
        let mut next = self.clone();
        next.hop += 1;
        next
    }

    /// A `(source, id)` key used to deduplicate rebroadcasts of the same message.
    #[must_use]
    pub fn dedup_key(&self) -> (NodeId, MessageId) {
        (self.source, self.id)
    }

    /// Encodes the message to bytes.
    ///
    /// Format:
    /// - 4 bytes: magic
    /// - 1 byte: message kind
    /// - 4 bytes: payload length (big-endian)
    /// - N bytes: JSON-encoded envelope
    ///
    /// # Errors
    ///
    /// Returns an error if the envelope cannot be serialized.
    pub fn encode(&self) -> Result<Bytes> {
        let body = serde_json::to_vec(self)?;
        if body.len() > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::TooLarge {
                size: body.len(),
                max: MAX_MESSAGE_SIZE,
            });
        }
        let mut buf = BytesMut::with_capacity(9 + body.len());
        buf.put_slice(&MAGIC);
        buf.put_u8(self.kind as u8);
        buf.put_u32(body.len() as u32);
        buf.put_slice(&body);
        Ok(buf.freeze())
    }

    /// Decodes a message from bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the message is malformed, oversized, or the magic/kind
    /// byte doesn't match the encoded envelope.
    pub fn decode(mut data: Bytes) -> Result<Self> {
        if data.len() < 9 {
            return Err(ProtocolError::Malformed("message too short".into()));
        }

        let magic: [u8; 4] = data[..4].try_into().unwrap();
        if magic != MAGIC {
            return Err(ProtocolError::InvalidMagic);
        }
        data.advance(4);

        let kind_byte = data.get_u8();
        let kind = MessageKind::from_byte(kind_byte)
            .ok_or_else(|| ProtocolError::Malformed(format!("unknown message kind: {kind_byte}")))?;

        let len = data.get_u32() as usize;
        if len > MAX_MESSAGE_SIZE {
            return Err(ProtocolError::TooLarge {
                size: len,
                max: MAX_MESSAGE_SIZE,
            });
        }
        if data.len() < len {
            return Err(ProtocolError::Malformed("incomplete payload".into()));
        }

        let body = data.slice(..len);
        let message: Message = serde_json::from_slice(&body)?;
        if message.kind != kind {
            return Err(ProtocolError::Malformed(
                "header kind does not match envelope kind".into(),
            ));
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn node(seed: u8) -> NodeId {
        use neuromesh_core::id::RawId;
        NodeId::from_raw(RawId::from_bytes([seed; 16]))
    }

    #[test]
    fn message_roundtrip() {
        let msg = Message::heartbeat(node(1), json!({"agents": 3}));
        let encoded = msg.encode().unwrap();
        let decoded = Message::decode(encoded).unwrap();
        assert_eq!(decoded.kind, MessageKind::Heartbeat);
        assert_eq!(decoded.source, msg.source);
    }

    #[test]
    fn message_invalid_magic() {
        let data = Bytes::from_static(b"BAAD\x00\x00\x00\x00\x00");
        let result = Message::decode(data);
        assert!(matches!(result, Err(ProtocolError::InvalidMagic)));
    }

    #[test]
    fn forward_increments_hop_and_respects_ttl() {
        let mut msg = Message::new(node(1), None, MessageKind::Broadcast, json!({}), 2);
        assert!(msg.can_forward());
        msg = msg.forwarded();
        assert_eq!(msg.hop, 1);
        assert!(!msg.can_forward());
    }

    #[test]
    fn dedup_key_distinguishes_source() {
        let a = Message::heartbeat(node(1), json!({}));
        let b = Message::heartbeat(node(2), json!({}));
        assert_ne!(a.dedup_key(), b.dedup_key());
    }
}
