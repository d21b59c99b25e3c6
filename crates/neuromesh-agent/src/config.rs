//! Agent Manager configuration and the per-agent spawn request.

use neuromesh_backend::NetworkConfig;
use neuromesh_core::AgentId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Caller-supplied parameters for `AgentManager::spawn`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpawnConfig {
    /// The network architecture to allocate for this agent.
    pub network: NetworkConfig,
    /// Opaque metadata persisted alongside the agent (name, task kind, ...).
    #[serde(default)]
    pub metadata: Value,
    /// Fixes the new agent's id instead of generating one. Used when a
    /// caller (e.g. a consensus-committed `AgentSpawn` transaction) already
    /// decided the id before this spawn runs, so every node that applies the
    /// same commit ends up with the same id.
    #[serde(default)]
    pub agent_id: Option<AgentId>,
}

/// Tunables governing the whole Agent Manager instance.
#[derive(Debug, Clone)]
pub struct AgentManagerConfig {
    /// Maximum number of simultaneously active agents.
    pub max_agents: usize,
    /// Target budget for `spawn`; exceeding it is logged, not an error.
    pub spawn_timeout: Duration,
    /// Deadline for `run_inference`; exceeding it fails with `Timeout`.
    pub inference_timeout: Duration,
    /// Assumed memory footprint per agent used only for the health-score
    /// memory-pressure penalty.
    pub memory_limit_per_agent: usize,
    /// Whether `share_knowledge` is permitted at all.
    pub cross_learning_enabled: bool,
    /// Default blend factor used when a `share_knowledge` caller doesn't specify one.
    pub default_blend: f32,
    /// Total weight/bias element budget handed to the numeric backend.
    pub backend_capacity_elements: usize,
}

impl Default for AgentManagerConfig {
    fn default() -> Self {
        Self {
            max_agents: 256,
            spawn_timeout: Duration::from_millis(12),
            inference_timeout: Duration::from_millis(75),
            memory_limit_per_agent: 1024 * 1024,
            cross_learning_enabled: true,
            default_blend: 0.1,
            backend_capacity_elements: 16_000_000,
        }
    }
}
