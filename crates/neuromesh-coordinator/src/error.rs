//! Coordinator error types.

use neuromesh_agent::AgentError;
use neuromesh_consensus::ConsensusError;
use neuromesh_p2p::P2pError;
use neuromesh_persistence::PersistenceError;
use thiserror::Error;

/// Errors raised while gluing agent, transport, topology, and consensus
/// operations together.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The Agent Manager rejected the operation.
    #[error("agent manager error: {0}")]
    Agent(#[from] AgentError),

    /// The consensus engine rejected the operation.
    #[error("consensus error: {0}")]
    Consensus(#[from] ConsensusError),

    /// Transport failed to deliver the message.
    #[error("transport error: {0}")]
    Transport(#[from] P2pError),

    /// The persistence backend failed.
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// A distributed operation was requested but `enable_consensus` is off,
    /// or this node was constructed without a validator keypair.
    #[error("consensus is not enabled on this node")]
    ConsensusDisabled,

    /// A mesh-wide operation was requested but `enable_p2p` is off.
    #[error("p2p transport is not enabled on this node")]
    P2pDisabled,

    /// Failed to encode or decode a JSON payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A specialized `Result` for Coordinator operations.
pub type Result<T> = std::result::Result<T, CoordinatorError>;
