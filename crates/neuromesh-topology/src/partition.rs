//! Partition detection via staleness and BFS reachability.

use crate::routing::Graph;
use neuromesh_core::{NodeId, Timestamp};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

/// How a detected partition should be recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStrategy {
    /// Attempt to reconnect to the affected nodes directly.
    Reconnect,
    /// Reconnection has repeatedly failed; escalate to an operator/higher layer.
    Escalate,
}

/// A detected mesh partition.
#[derive(Debug, Clone)]
pub struct Partition {
    /// Nodes currently unreachable or stale.
    pub affected_nodes: Vec<NodeId>,
    /// When the earliest still-affected node was first detected.
    pub start_time: Timestamp,
    /// The recovery approach for this partition.
    pub recovery_strategy: RecoveryStrategy,
    /// Consecutive detections this partition has persisted across; escalates
    /// `recovery_strategy` to `Escalate` once it crosses `escalate_after`.
    pub severity: u32,
}

/// Tracks partition state across successive `detect` calls so severity can
/// escalate for partitions that do not resolve themselves.
pub struct PartitionDetector {
    tracked: HashMap<NodeId, (Timestamp, u32)>,
    escalate_after: u32,
}

impl PartitionDetector {
    /// Creates a detector that escalates a partition's recovery strategy after
    /// `escalate_after` consecutive detections without resolution.
    #[must_use]
    pub fn new(escalate_after: u32) -> Self {
        Self {
            tracked: HashMap::new(),
            escalate_after,
        }
    }

    /// Evaluates `known_peers` for staleness (via `peer_last_seen`) and
    /// reachability (via BFS over `graph` from `self_id`), returning at most
    /// one aggregate [`Partition`] record covering everything currently
    /// affected. Returns an empty vec when the mesh is fully connected.
    pub fn detect(
        &mut self,
        self_id: NodeId,
        known_peers: &[NodeId],
        peer_last_seen: &HashMap<NodeId, Timestamp>,
        graph: &Graph,
        stale_threshold: Duration,
    ) -> Vec<Partition> {
        let now = Timestamp::now();
        let reachable = graph.reachable_from(self_id);

        let affected: Vec<NodeId> = known_peers
            .iter()
            .copied()
            .filter(|peer| {
                let stale = peer_last_seen
                    .get(peer)
                    .map_or(true, |seen| seen.elapsed_until(now) > stale_threshold);
                let unreachable = !reachable.contains(peer);
                stale || unreachable
            })
            .collect();

        let affected_set: HashSet<NodeId> = affected.iter().copied().collect();
        self.tracked.retain(|node, _| affected_set.contains(node));
        for &node in &affected {
            let entry = self.tracked.entry(node).or_insert((now, 0));
            entry.1 += 1;
        }

        if affected.is_empty() {
            return Vec::new();
        }

        let start_time = self
            .tracked
            .values()
            .map(|(started, _)| *started)
            .min()
            .unwrap_or(now);
        let severity = self
            .tracked
            .values()
            .map(|(_, severity)| *severity)
            .max()
            .unwrap_or(1);
        let recovery_strategy = if severity > self.escalate_after {
            RecoveryStrategy::Escalate
        } else {
            RecoveryStrategy::Reconnect
        };

        vec![Partition {
            affected_nodes: affected,
            start_time,
            recovery_strategy,
            severity,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_core::id::RawId;

    fn node(seed: u8) -> NodeId {
        NodeId::from_raw(RawId::from_bytes([seed; 16]))
    }

    #[test]
    fn fully_connected_mesh_has_no_partition() {
        let mut graph = Graph::new();
        let (a, b) = (node(1), node(2));
        graph.add_edge(a, b, Duration::from_millis(5));
        let mut detector = PartitionDetector::new(3);
        let last_seen = HashMap::from([(b, Timestamp::now())]);
        let result = detector.detect(a, &[b], &last_seen, &graph, Duration::from_secs(30));
        assert!(result.is_empty());
    }

    #[test]
    fn unreachable_peer_is_declared_partitioned() {
        let graph = Graph::new();
        let (a, b) = (node(1), node(2));
        let mut detector = PartitionDetector::new(3);
        let last_seen = HashMap::from([(b, Timestamp::now())]);
        let result = detector.detect(a, &[b], &last_seen, &graph, Duration::from_secs(30));
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].affected_nodes, vec![b]);
        assert_eq!(result[0].severity, 1);
    }

    #[test]
    fn persistent_partition_escalates_severity() {
        let graph = Graph::new();
        let (a, b) = (node(1), node(2));
        let mut detector = PartitionDetector::new(2);
        let last_seen = HashMap::from([(b, Timestamp::now())]);
        for _ in 0..3 {
            detector.detect(a, &[b], &last_seen, &graph, Duration::from_secs(30));
        }
        let result = detector.detect(a, &[b], &last_seen, &graph, Duration::from_secs(30));
        assert_eq!(result[0].severity, 4);
        assert_eq!(result[0].recovery_strategy, RecoveryStrategy::Escalate);
    }
}
