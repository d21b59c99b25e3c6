//! Topology error types.

use neuromesh_core::NodeId;
use thiserror::Error;

/// Errors raised by topology operations.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// A routing table lookup named a node with no known edges.
    #[error("node {0} is not present in the connection graph")]
    UnknownNode(NodeId),
}

/// A specialized `Result` type for topology operations.
pub type Result<T> = std::result::Result<T, TopologyError>;
