//! Degree-based rebalancing (SPEC_FULL.md §4.5).

use crate::candidate::CandidateInfo;
use crate::config::TopologyConfig;
use crate::selection::select_peers;
use neuromesh_core::{NodeId, Timestamp};

/// The peers to connect to and disconnect from after a rebalance pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RebalanceAction {
    /// Candidates to open new sessions to.
    pub connect: Vec<NodeId>,
    /// Connected peers to close sessions with.
    pub disconnect: Vec<NodeId>,
}

/// Compares the current degree against `ideal_degree` and decides what to
/// change. `connected` are peers with an open session; `candidates` are
/// everyone else known to the mesh and eligible to connect to.
#[must_use]
pub fn rebalance(
    connected: &[CandidateInfo],
    candidates: &[CandidateInfo],
    ideal_degree: usize,
    config: &TopologyConfig,
) -> RebalanceAction {
    let degree = connected.len();
    let mut action = RebalanceAction::default();

    if degree < ideal_degree {
        let needed = ideal_degree - degree;
        action.connect = select_peers(candidates, needed, config);
    } else if (degree as f64) > (ideal_degree as f64) * config.rebalance_high_multiplier {
        let excess = degree - ideal_degree;
        let now = Timestamp::now();
        let mut scored: Vec<&CandidateInfo> = connected.iter().collect();
        scored.sort_by(|a, b| {
            a.retention_score(now)
                .partial_cmp(&b.retention_score(now))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        action.disconnect = scored.into_iter().take(excess).map(|c| c.node_id).collect();
    }

    action
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_core::id::RawId;
    use std::time::Duration;

    fn candidate(seed: u8, latency_ms: u64, messages: u64, idle_minutes: i64) -> CandidateInfo {
        let now = Timestamp::now();
        CandidateInfo {
            node_id: NodeId::from_raw(RawId::from_bytes([seed; 16])),
            latency: Some(Duration::from_millis(latency_ms)),
            cpu_usage: 0.1,
            mem_usage: 0.1,
            agent_count: 0,
            degree: 1,
            message_count: messages,
            last_seen: Timestamp::from_millis(now.as_millis() - idle_minutes * 60_000),
            connected: true,
        }
    }

    #[test]
    fn low_degree_requests_connects() {
        let config = TopologyConfig::default();
        let connected = vec![candidate(1, 10, 5, 0)];
        let candidates = vec![candidate(2, 20, 0, 0), candidate(3, 30, 0, 0)];
        let action = rebalance(&connected, &candidates, 3, &config);
        assert_eq!(action.connect.len(), 2);
        assert!(action.disconnect.is_empty());
    }

    #[test]
    fn high_degree_drops_lowest_scoring() {
        let config = TopologyConfig::default();
        let connected = vec![
            candidate(1, 10, 100, 0),
            candidate(2, 500, 0, 60),
            candidate(3, 20, 50, 0),
        ];
        let action = rebalance(&connected, &[], 1, &config);
        assert_eq!(action.disconnect, vec![connected[1].node_id]);
    }
}
