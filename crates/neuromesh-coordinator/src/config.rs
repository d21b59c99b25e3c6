//! Unified configuration surface: the knobs every glued subsystem exposes,
//! collected behind the one config object external callers construct.

use neuromesh_agent::AgentManagerConfig;
use neuromesh_consensus::{ConsensusParams, EngineConfig, GenesisValidator};
use neuromesh_p2p::TransportConfig;
use neuromesh_topology::{SelectionMode, TopologyConfig};
use std::time::Duration;

/// The full set of tunables a caller may configure, mirrored one-for-one
/// onto the Agent Manager, Transport, Topology, and Consensus Engine this
/// crate glues together.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Maximum number of simultaneously active agents.
    pub max_agents: usize,
    /// Assumed memory footprint per agent used for the health-score penalty.
    pub memory_limit_per_agent: usize,
    /// Deadline for `run_inference`.
    pub inference_timeout: Duration,
    /// Target budget for `spawn`.
    pub spawn_timeout: Duration,
    /// Whether the numeric backend should prefer its SIMD implementation.
    pub simd_enabled: bool,
    /// Whether `share_knowledge` is permitted at all.
    pub cross_learning_enabled: bool,
    /// Whether agent state/events are durably recorded.
    pub persistence_enabled: bool,
    /// Whether the health/metrics snapshot surface is populated.
    pub performance_monitoring: bool,
    /// Whether this node joins the mesh transport at all.
    pub enable_p2p: bool,
    /// Whether agent lifecycle operations go through consensus.
    pub enable_consensus: bool,
    /// Upper bound on known mesh nodes tracked by Topology.
    pub max_network_nodes: usize,
    /// How long `Transport::connect` waits for a peer to become reachable.
    pub network_timeout: Duration,
    /// How often Transport broadcasts a heartbeat.
    pub heartbeat_interval: Duration,
    /// How often Topology may recompute routing/rebalancing.
    pub monitoring_interval: Duration,
    /// Target time between consensus block proposals.
    pub block_time: Duration,
    /// How long a pending transaction may wait before it is discarded.
    pub consensus_timeout: Duration,
    /// A peer/validator whose liveness exceeds this is a staleness candidate.
    pub stale_threshold: Duration,
    /// The Byzantine fault tolerance consensus refuses to start below.
    pub byzantine_fault_tolerance: usize,
    /// The genesis validator set, when `enable_consensus` is set.
    pub validator_nodes: Vec<GenesisValidator>,
    /// The peer-selection algorithm Topology uses.
    pub topology_algorithm: SelectionMode,
    /// Total weight/bias element budget handed to the numeric backend.
    pub backend_capacity_elements: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_agents: 256,
            memory_limit_per_agent: 1024 * 1024,
            inference_timeout: Duration::from_millis(75),
            spawn_timeout: Duration::from_millis(12),
            simd_enabled: true,
            cross_learning_enabled: true,
            persistence_enabled: false,
            performance_monitoring: true,
            enable_p2p: false,
            enable_consensus: false,
            max_network_nodes: 1000,
            network_timeout: Duration::from_secs(5),
            heartbeat_interval: Duration::from_secs(10),
            monitoring_interval: Duration::from_secs(30),
            block_time: Duration::from_millis(2000),
            consensus_timeout: Duration::from_secs(30),
            stale_threshold: Duration::from_secs(30),
            byzantine_fault_tolerance: 1,
            validator_nodes: Vec::new(),
            topology_algorithm: SelectionMode::default(),
            backend_capacity_elements: 16_000_000,
        }
    }
}

impl CoordinatorConfig {
    /// Projects onto the Agent Manager's own config shape.
    #[must_use]
    pub fn agent_manager_config(&self) -> AgentManagerConfig {
        AgentManagerConfig {
            max_agents: self.max_agents,
            spawn_timeout: self.spawn_timeout,
            inference_timeout: self.inference_timeout,
            memory_limit_per_agent: self.memory_limit_per_agent,
            cross_learning_enabled: self.cross_learning_enabled,
            backend_capacity_elements: self.backend_capacity_elements,
            ..AgentManagerConfig::default()
        }
    }

    /// Projects onto Transport's own config shape.
    #[must_use]
    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            connection_timeout: self.network_timeout,
            heartbeat_interval: self.heartbeat_interval,
            stale_threshold: self.stale_threshold,
            ..TransportConfig::default()
        }
    }

    /// Projects onto Topology's own config shape.
    #[must_use]
    pub fn topology_config(&self) -> TopologyConfig {
        TopologyConfig {
            mode: self.topology_algorithm,
            monitoring_interval: self.monitoring_interval,
            stale_threshold: self.stale_threshold,
            ..TopologyConfig::default()
        }
    }

    /// Projects onto the Consensus Engine's own config shape.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            block_time: self.block_time,
            byzantine_tolerance: self.byzantine_fault_tolerance,
            consensus_enabled: self.enable_consensus,
            ..EngineConfig::default()
        }
    }

    /// Projects onto a genesis's `ConsensusParams`.
    #[must_use]
    pub fn consensus_params(&self) -> ConsensusParams {
        ConsensusParams {
            block_time_ms: self.block_time.as_millis() as u64,
            consensus_timeout_ms: self.consensus_timeout.as_millis() as u64,
            byzantine_tolerance: self.byzantine_fault_tolerance,
            ..ConsensusParams::default()
        }
    }
}
