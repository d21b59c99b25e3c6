//! Transport error types.

use neuromesh_core::NodeId;
use thiserror::Error;

/// Errors that can occur during Transport operations.
#[derive(Debug, Error)]
pub enum P2pError {
    /// `connect` did not reach the peer within `connection_timeout`.
    #[error("peer {0} unreachable")]
    Unreachable(NodeId),

    /// `send` was called with no open session to the peer.
    #[error("no open session to peer {0}")]
    NotConnected(NodeId),

    /// `send` hit the backpressure threshold; the caller decides whether to retry.
    #[error("would block sending to peer {0}")]
    WouldBlock(NodeId),

    /// A wire envelope failed to decode or violated the protocol invariants.
    #[error("protocol error: {0}")]
    Protocol(#[from] neuromesh_protocol::ProtocolError),
}

/// A specialized `Result` type for Transport operations.
pub type Result<T> = std::result::Result<T, P2pError>;
