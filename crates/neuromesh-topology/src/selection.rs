//! Peer-selection algorithms (SPEC_FULL.md §4.5).

use crate::candidate::CandidateInfo;
use crate::config::{SelectionMode, TopologyConfig};
use neuromesh_core::NodeId;
use rand::seq::SliceRandom;
use rand::Rng;

/// Selects up to `target_degree` peers from `candidates` according to `config.mode`.
/// `candidates` should exclude peers already connected, so the result is a set of
/// peers to newly connect to.
#[must_use]
pub fn select_peers(
    candidates: &[CandidateInfo],
    target_degree: usize,
    config: &TopologyConfig,
) -> Vec<NodeId> {
    if target_degree == 0 || candidates.is_empty() {
        return Vec::new();
    }
    match config.mode {
        SelectionMode::NearestLatency => select_nearest_latency(candidates, target_degree),
        SelectionMode::SmallWorld => select_small_world(candidates, target_degree, config),
        SelectionMode::ScaleFree => select_scale_free(candidates, target_degree),
        SelectionMode::Adaptive => select_adaptive(candidates, target_degree),
    }
}

fn latency_key(candidate: &CandidateInfo) -> std::time::Duration {
    candidate.latency.unwrap_or(std::time::Duration::MAX)
}

fn select_nearest_latency(candidates: &[CandidateInfo], target_degree: usize) -> Vec<NodeId> {
    let mut sorted: Vec<&CandidateInfo> = candidates.iter().collect();
    sorted.sort_by_key(|c| latency_key(c));
    sorted
        .into_iter()
        .take(target_degree)
        .map(|c| c.node_id)
        .collect()
}

fn select_small_world(
    candidates: &[CandidateInfo],
    target_degree: usize,
    config: &TopologyConfig,
) -> Vec<NodeId> {
    let (mut local, distant): (Vec<&CandidateInfo>, Vec<&CandidateInfo>) = candidates
        .iter()
        .partition(|c| latency_key(c) < config.small_world_latency_threshold);
    local.sort_by_key(|c| latency_key(c));

    let random_slots = config.small_world_random_count.min(target_degree);
    let local_slots = target_degree.saturating_sub(random_slots);

    let mut selected: Vec<NodeId> = local.into_iter().take(local_slots).map(|c| c.node_id).collect();

    let mut distant = distant;
    distant.shuffle(&mut rand::thread_rng());
    let remaining = target_degree.saturating_sub(selected.len());
    selected.extend(distant.into_iter().take(remaining).map(|c| c.node_id));
    selected
}

fn select_scale_free(candidates: &[CandidateInfo], target_degree: usize) -> Vec<NodeId> {
    let mut pool: Vec<&CandidateInfo> = candidates.iter().collect();
    let mut selected = Vec::with_capacity(target_degree.min(pool.len()));
    let mut rng = rand::thread_rng();

    while !pool.is_empty() && selected.len() < target_degree {
        let total_weight: f64 = pool.iter().map(|c| c.degree as f64 + 1.0).sum();
        let mut pick = rng.gen_range(0.0..total_weight);
        let mut index = pool.len() - 1;
        for (i, candidate) in pool.iter().enumerate() {
            let weight = candidate.degree as f64 + 1.0;
            if pick < weight {
                index = i;
                break;
            }
            pick -= weight;
        }
        selected.push(pool.remove(index).node_id);
    }
    selected
}

fn select_adaptive(candidates: &[CandidateInfo], target_degree: usize) -> Vec<NodeId> {
    let mut sorted: Vec<&CandidateInfo> = candidates.iter().collect();
    sorted.sort_by(|a, b| {
        b.adaptive_score()
            .partial_cmp(&a.adaptive_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted
        .into_iter()
        .take(target_degree)
        .map(|c| c.node_id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_core::{id::RawId, Timestamp};
    use std::time::Duration;

    fn candidate(seed: u8, latency_ms: u64, degree: usize) -> CandidateInfo {
        CandidateInfo {
            node_id: NodeId::from_raw(RawId::from_bytes([seed; 16])),
            latency: Some(Duration::from_millis(latency_ms)),
            cpu_usage: 0.2,
            mem_usage: 0.2,
            agent_count: 1,
            degree,
            message_count: 0,
            last_seen: Timestamp::now(),
            connected: false,
        }
    }

    #[test]
    fn nearest_latency_picks_lowest_first() {
        let candidates = vec![candidate(1, 100, 0), candidate(2, 10, 0), candidate(3, 50, 0)];
        let selected = select_nearest_latency(&candidates, 2);
        assert_eq!(selected, vec![candidates[1].node_id, candidates[2].node_id]);
    }

    #[test]
    fn adaptive_respects_target_degree() {
        let config = TopologyConfig::default();
        let candidates: Vec<_> = (0..10).map(|i| candidate(i, i as u64 * 5, 1)).collect();
        let selected = select_peers(&candidates, 3, &config);
        assert_eq!(selected.len(), 3);
    }

    #[test]
    fn scale_free_never_exceeds_pool_size() {
        let candidates = vec![candidate(1, 10, 5), candidate(2, 20, 0)];
        let selected = select_scale_free(&candidates, 10);
        assert_eq!(selected.len(), 2);
    }
}
