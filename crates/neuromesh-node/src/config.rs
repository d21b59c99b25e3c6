//! # Node Configuration
//!
//! Aggregates every tunable in SPEC_FULL.md §6's control-surface table plus
//! the process-level concerns (listen address, data directory, log level)
//! that table leaves to the node binary. Loadable from a TOML file,
//! overridable from `NEUROMESH_`-prefixed environment variables, and
//! validated with the `validator` crate.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `NEUROMESH_HEALTH_ADDR` | Health/readiness HTTP address | `127.0.0.1:8080` |
//! | `NEUROMESH_LOG_LEVEL` | Log level | `info` |
//! | `NEUROMESH_LOG_FORMAT` | Log format (json/pretty) | `json` |
//! | `NEUROMESH_PRIVATE_KEY` | Ed25519 private key seed (hex) | *random if unset* |
//! | `NEUROMESH_DATA_DIR` | Data directory | `./data` |
//!
//! ## Usage
//!
//! ```rust,ignore
//! use neuromesh_node::config::NodeConfig;
//!
//! let mut config = NodeConfig::default();
//! config.merge_env().expect("invalid environment override");
//! config.validate_config().expect("configuration validation failed");
//! ```

use neuromesh_consensus::GenesisValidator;
use neuromesh_coordinator::CoordinatorConfig;
use neuromesh_topology::{SelectionMode, TopologyConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Configuration loading/validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// Environment variable parsing error.
    #[error("failed to parse environment variable {key}: {message}")]
    EnvParse {
        /// The offending variable's name.
        key: String,
        /// Why it could not be parsed.
        message: String,
    },

    /// File loading error.
    #[error("failed to load configuration file: {0}")]
    FileLoad(String),

    /// Validation error.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Main node configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct NodeConfig {
    /// Mesh/agent/consensus tunables, mirrored onto [`CoordinatorConfig`].
    #[validate(nested)]
    #[serde(default)]
    pub mesh: MeshConfig,

    /// Health/readiness HTTP server configuration.
    #[validate(nested)]
    #[serde(default)]
    pub health: HealthConfig,

    /// Logging configuration.
    #[validate(nested)]
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Storage configuration.
    #[validate(nested)]
    #[serde(default)]
    pub storage: StorageConfig,

    /// Resilience configuration.
    #[validate(nested)]
    #[serde(default)]
    pub resilience: ResilienceConfig,

    /// Ed25519 seed (hex-encoded `u64`, big-endian) for this node's identity.
    /// A fresh random keypair is generated if unset.
    #[serde(default)]
    pub private_key_seed: Option<String>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            mesh: MeshConfig::default(),
            health: HealthConfig::default(),
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            resilience: ResilienceConfig::default(),
            private_key_seed: None,
        }
    }
}

impl NodeConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileLoad(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::FileLoad(e.to_string()))
    }

    /// Overrides fields explicitly set via `NEUROMESH_*` environment
    /// variables, leaving everything else untouched.
    pub fn merge_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(addr) = std::env::var("NEUROMESH_HEALTH_ADDR") {
            self.health.addr = addr.parse().map_err(|_| ConfigError::EnvParse {
                key: "NEUROMESH_HEALTH_ADDR".to_string(),
                message: "invalid socket address".to_string(),
            })?;
        }
        if let Ok(level) = std::env::var("NEUROMESH_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("NEUROMESH_LOG_FORMAT") {
            self.logging.format = format;
        }
        if let Ok(dir) = std::env::var("NEUROMESH_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Ok(seed) = std::env::var("NEUROMESH_PRIVATE_KEY") {
            self.private_key_seed = Some(seed);
        }
        Ok(())
    }

    /// Validates the configuration, including cross-field rules the
    /// `validator` crate's field attributes cannot express on their own.
    pub fn validate_config(&self) -> Result<(), ConfigError> {
        self.validate().map_err(|e| ConfigError::Validation(e.to_string()))?;

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "invalid log level '{}'. valid values: {:?}",
                self.logging.level, valid_levels
            )));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "invalid log format '{}'. valid values: {:?}",
                self.logging.format, valid_formats
            )));
        }

        if self.mesh.enable_consensus {
            let n = self.mesh.validator_nodes.len();
            let f = self.mesh.byzantine_fault_tolerance;
            if n < 3 * f + 1 {
                return Err(ConfigError::Invalid(format!(
                    "validator_nodes.len() ({n}) does not satisfy byzantine_fault_tolerance ({f}): need at least {}",
                    3 * f + 1
                )));
            }
        }

        Ok(())
    }

    /// Projects onto [`CoordinatorConfig`].
    #[must_use]
    pub fn coordinator_config(&self) -> CoordinatorConfig {
        let mesh = &self.mesh;
        CoordinatorConfig {
            max_agents: mesh.max_agents,
            memory_limit_per_agent: mesh.memory_limit_per_agent,
            inference_timeout: Duration::from_millis(mesh.inference_timeout_ms),
            spawn_timeout: Duration::from_millis(mesh.spawn_timeout_ms),
            simd_enabled: mesh.simd_enabled,
            cross_learning_enabled: mesh.cross_learning_enabled,
            persistence_enabled: mesh.persistence_enabled,
            performance_monitoring: mesh.performance_monitoring,
            enable_p2p: mesh.enable_p2p,
            enable_consensus: mesh.enable_consensus,
            max_network_nodes: mesh.max_network_nodes,
            network_timeout: Duration::from_millis(mesh.network_timeout_ms),
            heartbeat_interval: Duration::from_millis(mesh.heartbeat_interval_ms),
            monitoring_interval: Duration::from_millis(mesh.monitoring_interval_ms),
            block_time: Duration::from_millis(mesh.block_time_ms),
            consensus_timeout: Duration::from_millis(mesh.consensus_timeout_ms),
            stale_threshold: Duration::from_millis(mesh.stale_threshold_ms),
            byzantine_fault_tolerance: mesh.byzantine_fault_tolerance,
            validator_nodes: mesh.validator_nodes.clone(),
            topology_algorithm: mesh.topology_algorithm,
            backend_capacity_elements: mesh.backend_capacity_elements,
        }
    }

    /// Projects onto a standalone [`TopologyConfig`] for the caller-owned
    /// `Topology` instance (mirrors [`CoordinatorConfig::topology_config`],
    /// duplicated here since `neuromesh-node`, not `neuromesh-coordinator`,
    /// owns the `Topology`).
    #[must_use]
    pub fn topology_config(&self) -> TopologyConfig {
        TopologyConfig {
            mode: self.mesh.topology_algorithm,
            monitoring_interval: Duration::from_millis(self.mesh.monitoring_interval_ms),
            stale_threshold: Duration::from_millis(self.mesh.stale_threshold_ms),
            ..TopologyConfig::default()
        }
    }
}

/// SPEC_FULL.md §6's control-surface table, one field per row.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct MeshConfig {
    /// Hard cap on concurrent agents.
    #[validate(range(min = 1, max = 100_000))]
    pub max_agents: usize,
    /// Per-agent memory bound, in bytes.
    pub memory_limit_per_agent: usize,
    /// Deadline for `run_inference`, in milliseconds.
    pub inference_timeout_ms: u64,
    /// Target budget for `spawn`, in milliseconds.
    pub spawn_timeout_ms: u64,
    /// Prefer the SIMD backend if available.
    pub simd_enabled: bool,
    /// Permit `share_knowledge`.
    pub cross_learning_enabled: bool,
    /// Use the Persistence Store.
    pub persistence_enabled: bool,
    /// Emit metrics updates.
    pub performance_monitoring: bool,
    /// Wire in Transport + Topology.
    pub enable_p2p: bool,
    /// Run the Consensus Engine.
    pub enable_consensus: bool,
    /// Cap on known peers.
    pub max_network_nodes: usize,
    /// Default transport deadline, in milliseconds.
    pub network_timeout_ms: u64,
    /// Heartbeat cadence, in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Topology monitoring cadence, in milliseconds.
    pub monitoring_interval_ms: u64,
    /// Target time between consensus block proposals, in milliseconds.
    pub block_time_ms: u64,
    /// How long a pending transaction may wait before being discarded, in
    /// milliseconds.
    pub consensus_timeout_ms: u64,
    /// Peer/validator staleness threshold, in milliseconds.
    pub stale_threshold_ms: u64,
    /// Byzantine fault tolerance fraction `f` the validator set must satisfy.
    pub byzantine_fault_tolerance: usize,
    /// The initial validator set.
    #[serde(default)]
    pub validator_nodes: Vec<GenesisValidator>,
    /// The peer-selection algorithm.
    pub topology_algorithm: SelectionMode,
    /// Total weight/bias element budget handed to the numeric backend.
    pub backend_capacity_elements: usize,
}

impl Default for MeshConfig {
    fn default() -> Self {
        let defaults = CoordinatorConfig::default();
        Self {
            max_agents: defaults.max_agents,
            memory_limit_per_agent: defaults.memory_limit_per_agent,
            inference_timeout_ms: defaults.inference_timeout.as_millis() as u64,
            spawn_timeout_ms: defaults.spawn_timeout.as_millis() as u64,
            simd_enabled: defaults.simd_enabled,
            cross_learning_enabled: defaults.cross_learning_enabled,
            persistence_enabled: defaults.persistence_enabled,
            performance_monitoring: defaults.performance_monitoring,
            enable_p2p: defaults.enable_p2p,
            enable_consensus: defaults.enable_consensus,
            max_network_nodes: defaults.max_network_nodes,
            network_timeout_ms: defaults.network_timeout.as_millis() as u64,
            heartbeat_interval_ms: defaults.heartbeat_interval.as_millis() as u64,
            monitoring_interval_ms: defaults.monitoring_interval.as_millis() as u64,
            block_time_ms: defaults.block_time.as_millis() as u64,
            consensus_timeout_ms: defaults.consensus_timeout.as_millis() as u64,
            stale_threshold_ms: defaults.stale_threshold.as_millis() as u64,
            byzantine_fault_tolerance: defaults.byzantine_fault_tolerance,
            validator_nodes: defaults.validator_nodes,
            topology_algorithm: defaults.topology_algorithm,
            backend_capacity_elements: defaults.backend_capacity_elements,
        }
    }
}

/// Health/readiness HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct HealthConfig {
    /// Listen address for `/healthz`, `/readyz`, and `/status`.
    pub addr: SocketAddr,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".parse().expect("valid default address"),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: String,
    /// Log format (json, pretty).
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct StorageConfig {
    /// Data directory (currently informational: `MemoryStore` is the only
    /// persistence backend `neuromesh-coordinator` selects today).
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
        }
    }
}

/// Resilience configuration, projected onto [`crate::resilience::RetryPolicy`]
/// and [`crate::resilience::CircuitBreaker`].
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct ResilienceConfig {
    /// Retry configuration.
    #[validate(nested)]
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct RetryConfig {
    /// Maximum retry attempts.
    #[validate(range(min = 0, max = 10))]
    pub max_attempts: u32,
    /// Initial delay in milliseconds.
    #[validate(range(min = 1, max = 60_000))]
    pub initial_delay_ms: u64,
    /// Maximum delay in milliseconds.
    #[validate(range(min = 1, max = 300_000))]
    pub max_delay_ms: u64,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            max_delay_ms: 5000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Converts to [`crate::resilience::RetryPolicy`].
    #[must_use]
    pub fn to_policy(&self) -> crate::resilience::RetryPolicy {
        crate::resilience::RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
            jitter: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = NodeConfig::default();
        assert!(config.validate_config().is_ok());
    }

    #[test]
    fn log_level_validation() {
        let mut config = NodeConfig::default();
        for level in &["trace", "debug", "info", "warn", "error"] {
            config.logging.level = (*level).to_string();
            assert!(config.validate_config().is_ok());
        }
        config.logging.level = "invalid".to_string();
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn consensus_requires_enough_validators_for_byzantine_tolerance() {
        let mut config = NodeConfig::default();
        config.mesh.enable_consensus = true;
        config.mesh.byzantine_fault_tolerance = 1;
        config.mesh.validator_nodes = vec![GenesisValidator {
            name: "only-one".to_string(),
            pubkey: "00".repeat(32),
            stake: 1,
        }];
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn round_trips_through_toml() {
        let config = NodeConfig::default();
        let serialized = toml::to_string(&config).unwrap();
        let parsed: NodeConfig = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.mesh.max_agents, config.mesh.max_agents);
    }
}
