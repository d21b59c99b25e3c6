//! Agent Manager error types.

use neuromesh_backend::BackendError;
use neuromesh_core::AgentId;
use thiserror::Error;

/// Errors raised by Agent Manager operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// `spawn` was called while `active count >= max_agents`.
    #[error("capacity exceeded: {active}/{max_agents} agents active")]
    CapacityExceeded {
        /// Currently active agents.
        active: usize,
        /// Configured ceiling.
        max_agents: usize,
    },

    /// The numeric backend failed to allocate, run, or train a network.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// An operation targeting `agent_id` was called but no such agent exists.
    #[error("agent not found: {0}")]
    NotFound(AgentId),

    /// `run_inference` did not complete within `inference_timeout`.
    #[error("inference timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// `train` or `share_knowledge` was called while the agent was not `Active`.
    #[error("agent {agent_id} is not active (currently {state})")]
    NotActive {
        /// The agent in question.
        agent_id: AgentId,
        /// Its current state, for diagnostics.
        state: String,
    },

    /// `share_knowledge` was called while cross-learning is disabled.
    #[error("cross-learning is disabled")]
    Disabled,
}

/// A specialized `Result` for Agent Manager operations.
pub type Result<T> = std::result::Result<T, AgentError>;
