//! Mesh-wide health metrics (SPEC_FULL.md §4.5).

use serde::Serialize;

/// Mesh-wide health snapshot.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MeshMetrics {
    /// `active_connections / (n*(n-1)/2)`.
    pub density: f64,
    /// Mean of connectivity/latency/partition scores, each in `[0, 100]`.
    pub network_health: f64,
}

/// Computes mesh density for `n` known nodes and `active_connections` edges.
#[must_use]
pub fn density(n: usize, active_connections: usize) -> f64 {
    if n < 2 {
        return 0.0;
    }
    let max_edges = (n * (n - 1)) / 2;
    active_connections as f64 / max_edges as f64
}

/// Combines three `[0, 100]` component scores into the overall network health.
#[must_use]
pub fn network_health(connectivity_score: f64, latency_score: f64, partition_score: f64) -> f64 {
    (connectivity_score + latency_score + partition_score) / 3.0
}

/// `reachable_peers / known_peers * 100`, clamped to `[0, 100]`.
#[must_use]
pub fn connectivity_score(reachable_peers: usize, known_peers: usize) -> f64 {
    if known_peers == 0 {
        return 100.0;
    }
    (reachable_peers as f64 / known_peers as f64 * 100.0).clamp(0.0, 100.0)
}

/// `100` at zero latency, decaying towards `0` as `avg_latency_ms` grows;
/// matches the `1/(latency+1)`-style decay used elsewhere in this subsystem.
#[must_use]
pub fn latency_score(avg_latency_ms: f64) -> f64 {
    (100.0 / (avg_latency_ms / 50.0 + 1.0)).clamp(0.0, 100.0)
}

/// `100` with no open partitions, decaying by `20` points per open partition
/// (floored at `0`).
#[must_use]
pub fn partition_score(open_partitions: usize) -> f64 {
    (100.0 - 20.0 * open_partitions as f64).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn density_of_complete_graph_is_one() {
        assert_eq!(density(4, 6), 1.0);
    }

    #[test]
    fn density_with_fewer_than_two_nodes_is_zero() {
        assert_eq!(density(1, 0), 0.0);
    }

    #[test]
    fn partition_score_floors_at_zero() {
        assert_eq!(partition_score(10), 0.0);
    }
}
