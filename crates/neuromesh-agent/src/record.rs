//! The per-agent snapshot returned to callers outside the Agent Manager.

use crate::state::AgentState;
use neuromesh_backend::NetworkKind;
use neuromesh_core::{AgentId, Timestamp};
use serde::Serialize;

/// A point-in-time, read-only view of one agent's record.
///
/// Everything here is maintained exclusively by [`crate::AgentManager`];
/// `total_inferences` only ever increases for the lifetime of the agent.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AgentSnapshot {
    /// The agent's id.
    pub id: AgentId,
    /// The agent's current lifecycle state.
    pub state: AgentState,
    /// The architecture family this agent's network was spawned with.
    pub network_kind: NetworkKind,
    /// When `spawn` created this record.
    pub created_at: Timestamp,
    /// When this agent last completed an inference, training round, or
    /// knowledge-sharing exchange.
    pub last_active: Timestamp,
    /// Estimated bytes of weights/biases currently allocated for this agent.
    pub memory_usage_bytes: usize,
    /// Total `run_inference` calls this agent has completed. Monotonically
    /// non-decreasing for the agent's lifetime.
    pub total_inferences: u64,
    /// Running mean of this agent's own `run_inference` latency, in milliseconds.
    pub avg_inference_ms: f64,
    /// Progress of the most recent (or in-flight) `train` call, in `[0, 1]`:
    /// `convergence_epoch / epochs`.
    pub learning_progress: f32,
    /// How strongly this agent's weights have been blended from peers via
    /// `share_knowledge`, in `[0, 1]`; moves toward `1.0` with each incoming
    /// blend and never resets.
    pub connection_strength: f32,
}
