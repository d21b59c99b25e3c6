//! # Neuromesh Topology
//!
//! Mesh Topology (SPEC_FULL.md §4.5): picks which peers to connect to,
//! maintains a routing table over the current connection graph, detects
//! partitions, and decides when to rebalance. This crate is pure decision
//! logic — it owns no sockets and spawns no tasks; a caller (typically
//! `neuromesh-node`) feeds it Transport telemetry and acts on what it
//! returns.
//!
//! ```
//! use neuromesh_topology::{CandidateInfo, Topology, TopologyConfig};
//! use neuromesh_core::{NodeId, Timestamp};
//!
//! let self_id = NodeId::generate();
//! let mut topology = Topology::new(self_id, TopologyConfig::default());
//! let peer = NodeId::generate();
//! topology.record_candidate(CandidateInfo {
//!     node_id: peer,
//!     latency: None,
//!     cpu_usage: 0.1,
//!     mem_usage: 0.1,
//!     agent_count: 0,
//!     degree: 0,
//!     message_count: 0,
//!     last_seen: Timestamp::now(),
//!     connected: false,
//! });
//! let _ = topology.select_new_peers();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod candidate;
mod config;
mod error;
mod metrics;
mod partition;
mod rebalance;
mod routing;
mod selection;

pub use candidate::CandidateInfo;
pub use config::{ideal_degree, SelectionMode, TopologyConfig};
pub use error::{Result, TopologyError};
pub use metrics::MeshMetrics;
pub use partition::{Partition, PartitionDetector, RecoveryStrategy};
pub use rebalance::RebalanceAction;
pub use routing::{Graph, RoutingTable};
pub use selection::select_peers;

use neuromesh_core::{NodeId, Timestamp};
use std::collections::HashMap;
use std::time::Duration;

/// The default number of consecutive unresolved detections before a
/// partition's recovery strategy escalates.
const DEFAULT_ESCALATE_AFTER: u32 = 3;

/// Owns everything Mesh Topology needs to make its decisions: the candidate
/// pool, the connection graph, the routing table, and partition state.
pub struct Topology {
    self_id: NodeId,
    config: TopologyConfig,
    candidates: HashMap<NodeId, CandidateInfo>,
    graph: Graph,
    routing_table: RoutingTable,
    detector: PartitionDetector,
    last_routing_recompute: Timestamp,
}

impl Topology {
    /// Creates an empty topology for `self_id`.
    #[must_use]
    pub fn new(self_id: NodeId, config: TopologyConfig) -> Self {
        Self {
            self_id,
            config,
            candidates: HashMap::new(),
            graph: Graph::new(),
            routing_table: RoutingTable::default(),
            detector: PartitionDetector::new(DEFAULT_ESCALATE_AFTER),
            last_routing_recompute: Timestamp::now(),
        }
    }

    /// Records or replaces telemetry for a known peer.
    pub fn record_candidate(&mut self, info: CandidateInfo) {
        self.candidates.insert(info.node_id, info);
    }

    /// Drops all knowledge of `node_id`.
    pub fn forget(&mut self, node_id: NodeId) {
        self.candidates.remove(&node_id);
        self.graph.remove_node(node_id);
    }

    /// Records that a session to `peer_id` is open with the given measured
    /// latency, adding an edge to the connection graph and recomputing the
    /// routing table.
    pub fn record_session(&mut self, peer_id: NodeId, latency: Duration) {
        self.graph.add_edge(self.self_id, peer_id, latency);
        if let Some(candidate) = self.candidates.get_mut(&peer_id) {
            candidate.connected = true;
            candidate.latency = Some(latency);
        }
        self.recompute_routing();
    }

    /// Records that the session to `peer_id` closed, removing its graph edge
    /// and recomputing the routing table.
    pub fn remove_session(&mut self, peer_id: NodeId) {
        self.graph.remove_edge(self.self_id, peer_id);
        if let Some(candidate) = self.candidates.get_mut(&peer_id) {
            candidate.connected = false;
        }
        self.recompute_routing();
    }

    /// The ideal degree for the currently known peer count.
    #[must_use]
    pub fn ideal_degree(&self) -> usize {
        ideal_degree(self.candidates.len())
    }

    /// Selects new peers to connect to, per the configured [`SelectionMode`],
    /// excluding peers already connected and bounded by the ideal degree.
    #[must_use]
    pub fn select_new_peers(&self) -> Vec<NodeId> {
        let connected_count = self.candidates.values().filter(|c| c.connected).count();
        let target = self.ideal_degree().saturating_sub(connected_count);
        let pool: Vec<CandidateInfo> = self
            .candidates
            .values()
            .filter(|c| !c.connected)
            .cloned()
            .collect();
        select_peers(&pool, target, &self.config)
    }

    /// Recomputes the routing table immediately. Callers on a timer should
    /// prefer [`Topology::maybe_recompute_routing`] to respect
    /// `monitoring_interval`.
    pub fn recompute_routing(&mut self) {
        self.routing_table = RoutingTable::compute(&self.graph, &[self.self_id]);
        self.last_routing_recompute = Timestamp::now();
        tracing::debug!(
            known_nodes = self.candidates.len(),
            "recomputed mesh routing table"
        );
    }

    /// Recomputes the routing table only if `monitoring_interval` has
    /// elapsed since the last recompute; intended for periodic churn-driven
    /// callers (peer join/leave should call [`Topology::recompute_routing`]
    /// directly instead).
    pub fn maybe_recompute_routing(&mut self) {
        if self
            .last_routing_recompute
            .elapsed_until(Timestamp::now())
            >= self.config.monitoring_interval
        {
            self.recompute_routing();
        }
    }

    /// The current routing table.
    #[must_use]
    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    /// The first hop towards `destination`, for a destination this topology
    /// has at least heard of.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::UnknownNode`] if `destination` has never been
    /// recorded as a candidate; returns `Ok(None)` (not an error) if it is
    /// known but currently unreachable.
    pub fn route_to(&self, destination: NodeId) -> Result<Option<NodeId>> {
        if destination != self.self_id && !self.candidates.contains_key(&destination) {
            return Err(TopologyError::UnknownNode(destination));
        }
        Ok(self.routing_table.next_hop(self.self_id, destination))
    }

    /// Computes what to connect to / disconnect from given the current
    /// degree and candidate pool.
    #[must_use]
    pub fn rebalance(&self) -> RebalanceAction {
        let connected: Vec<CandidateInfo> = self
            .candidates
            .values()
            .filter(|c| c.connected)
            .cloned()
            .collect();
        let unconnected: Vec<CandidateInfo> = self
            .candidates
            .values()
            .filter(|c| !c.connected)
            .cloned()
            .collect();
        rebalance::rebalance(&connected, &unconnected, self.ideal_degree(), &self.config)
    }

    /// Runs partition detection over the current candidate pool and graph.
    pub fn detect_partitions(&mut self) -> Vec<Partition> {
        let known_peers: Vec<NodeId> = self.candidates.keys().copied().collect();
        let last_seen: HashMap<NodeId, Timestamp> = self
            .candidates
            .iter()
            .map(|(id, info)| (*id, info.last_seen))
            .collect();
        let partitions = self.detector.detect(
            self.self_id,
            &known_peers,
            &last_seen,
            &self.graph,
            self.config.stale_threshold,
        );
        if let Some(partition) = partitions.first() {
            tracing::warn!(
                affected = partition.affected_nodes.len(),
                severity = partition.severity,
                "mesh partition detected"
            );
        }
        partitions
    }

    /// The current mesh-wide health snapshot.
    #[must_use]
    pub fn metrics(&self) -> MeshMetrics {
        let known = self.candidates.len();
        let reachable = self.graph.reachable_from(self.self_id).len().saturating_sub(1);
        let active_connections = self.candidates.values().filter(|c| c.connected).count();
        let avg_latency_ms = {
            let latencies: Vec<f64> = self
                .candidates
                .values()
                .filter(|c| c.connected)
                .filter_map(|c| c.latency)
                .map(|d| d.as_secs_f64() * 1000.0)
                .collect();
            if latencies.is_empty() {
                0.0
            } else {
                latencies.iter().sum::<f64>() / latencies.len() as f64
            }
        };
        let open_partitions = usize::from(reachable < known);

        MeshMetrics {
            density: metrics::density(known + 1, active_connections),
            network_health: metrics::network_health(
                metrics::connectivity_score(reachable, known),
                metrics::latency_score(avg_latency_ms),
                metrics::partition_score(open_partitions),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_core::id::RawId;

    fn node(seed: u8) -> NodeId {
        NodeId::from_raw(RawId::from_bytes([seed; 16]))
    }

    fn candidate(node_id: NodeId) -> CandidateInfo {
        CandidateInfo {
            node_id,
            latency: None,
            cpu_usage: 0.1,
            mem_usage: 0.1,
            agent_count: 0,
            degree: 0,
            message_count: 0,
            last_seen: Timestamp::now(),
            connected: false,
        }
    }

    #[test]
    fn select_new_peers_excludes_connected() {
        let self_id = node(0);
        let mut topology = Topology::new(self_id, TopologyConfig::default());
        let a = node(1);
        let b = node(2);
        topology.record_candidate(candidate(a));
        topology.record_candidate(candidate(b));
        topology.record_session(a, Duration::from_millis(10));

        let selected = topology.select_new_peers();
        assert!(!selected.contains(&a));
    }

    #[test]
    fn routing_table_updates_after_session_change() {
        let self_id = node(0);
        let mut topology = Topology::new(self_id, TopologyConfig::default());
        let peer = node(1);
        topology.record_candidate(candidate(peer));
        topology.record_session(peer, Duration::from_millis(15));
        assert_eq!(
            topology.routing_table().distance(self_id, peer),
            Some(Duration::from_millis(15))
        );

        topology.remove_session(peer);
        assert_eq!(topology.routing_table().distance(self_id, peer), None);
    }

    #[test]
    fn route_to_unknown_node_is_an_error() {
        let self_id = node(0);
        let topology = Topology::new(self_id, TopologyConfig::default());
        let result = topology.route_to(node(99));
        assert!(matches!(result, Err(TopologyError::UnknownNode(_))));
    }

    #[test]
    fn route_to_known_but_unreachable_is_ok_none() {
        let self_id = node(0);
        let mut topology = Topology::new(self_id, TopologyConfig::default());
        let peer = node(1);
        topology.record_candidate(candidate(peer));
        assert!(matches!(topology.route_to(peer), Ok(None)));
    }

    #[test]
    fn detect_partitions_flags_unconnected_known_peer() {
        let self_id = node(0);
        let mut topology = Topology::new(self_id, TopologyConfig::default());
        let peer = node(1);
        topology.record_candidate(candidate(peer));
        let partitions = topology.detect_partitions();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].affected_nodes, vec![peer]);
    }
}
