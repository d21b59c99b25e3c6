//! Topology tunables and peer-selection mode.

use std::time::Duration;

/// The algorithm used to pick which peers to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Prefer peers with the lowest measured latency.
    NearestLatency,
    /// A local neighborhood of low-latency peers plus a few random distant ones.
    SmallWorld,
    /// Preferential attachment to existing high-degree hubs.
    ScaleFree,
    /// Scores every candidate and takes the top-K; the default.
    #[default]
    Adaptive,
}

/// Tunables for a [`crate::Topology`] instance.
#[derive(Debug, Clone)]
pub struct TopologyConfig {
    /// The peer-selection algorithm.
    pub mode: SelectionMode,
    /// How often periodic rebalancing/routing recomputation may run.
    pub monitoring_interval: Duration,
    /// A peer whose `last_seen` exceeds this is a partition candidate.
    pub stale_threshold: Duration,
    /// Small-world mode: peers below this latency are "local".
    pub small_world_latency_threshold: Duration,
    /// Small-world mode: how many additional random distant peers to keep.
    pub small_world_random_count: usize,
    /// Rebalancing trigger: remove lowest-scoring connections above `ideal * this`.
    pub rebalance_high_multiplier: f64,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            monitoring_interval: Duration::from_secs(30),
            stale_threshold: Duration::from_secs(30),
            small_world_latency_threshold: Duration::from_millis(50),
            small_world_random_count: 2,
            rebalance_high_multiplier: 1.5,
        }
    }
}

/// The target node degree for the current peer count, per SPEC_FULL.md §4.5:
/// `min(5, floor(sqrt(|peers|)))`.
#[must_use]
pub fn ideal_degree(known_peer_count: usize) -> usize {
    let sqrt_degree = (known_peer_count as f64).sqrt().floor() as usize;
    sqrt_degree.min(5)
}
