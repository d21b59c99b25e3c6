//! The per-agent state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An agent's position in its lifecycle.
///
/// ```text
/// Initializing --spawn ok--> Active --train--> Learning --done/err--> Active
///                            |                                          |
///                            \---------------- terminate ---------------v
///                                                                  Terminating
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    /// Network allocation is in progress; not yet visible to other operations.
    Initializing,
    /// Ready for inference, training, or knowledge sharing.
    Active,
    /// A `train` call is in flight; `run_inference` may still proceed.
    Learning,
    /// `terminate` has been called; the agent is being torn down.
    Terminating,
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentState::Initializing => "Initializing",
            AgentState::Active => "Active",
            AgentState::Learning => "Learning",
            AgentState::Terminating => "Terminating",
        };
        write!(f, "{s}")
    }
}
