//! Aggregate metrics across all agents, and the health-score computation.

use crate::config::AgentManagerConfig;
use parking_lot::Mutex;
use serde::Serialize;

/// A point-in-time snapshot returned by `AgentManager::snapshot_metrics`.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ManagerMetrics {
    /// Total agents ever spawned (including ones since terminated).
    pub total_spawned: u64,
    /// Running mean of `spawn` latency, in milliseconds.
    pub avg_spawn_ms: f64,
    /// Running mean of `run_inference` latency, in milliseconds, across all agents.
    pub avg_inference_ms: f64,
    /// Estimated total bytes of weights/biases currently allocated.
    pub memory_usage: usize,
    /// Agents currently in a `train` call.
    pub active_learning_tasks: u64,
    /// Composite health score in `[0, 100]`.
    pub health_score: u8,
}

#[derive(Default)]
struct Inner {
    total_spawned: u64,
    spawn_ms_sum: f64,
    spawn_count: u64,
    inference_ms_sum: f64,
    inference_count: u64,
    active_learning_tasks: u64,
    memory_usage: usize,
}

/// Thread-safe accumulator feeding `ManagerMetrics` snapshots.
#[derive(Default)]
pub(crate) struct Metrics {
    inner: Mutex<Inner>,
}

impl Metrics {
    pub(crate) fn record_spawn(&self, elapsed_ms: f64, bytes: usize) {
        let mut inner = self.inner.lock();
        inner.total_spawned += 1;
        inner.spawn_ms_sum += elapsed_ms;
        inner.spawn_count += 1;
        inner.memory_usage += bytes;
    }

    pub(crate) fn record_release(&self, bytes: usize) {
        let mut inner = self.inner.lock();
        inner.memory_usage = inner.memory_usage.saturating_sub(bytes);
    }

    pub(crate) fn record_inference(&self, elapsed_ms: f64) {
        let mut inner = self.inner.lock();
        inner.inference_ms_sum += elapsed_ms;
        inner.inference_count += 1;
    }

    pub(crate) fn learning_started(&self) {
        self.inner.lock().active_learning_tasks += 1;
    }

    pub(crate) fn learning_finished(&self) {
        let mut inner = self.inner.lock();
        inner.active_learning_tasks = inner.active_learning_tasks.saturating_sub(1);
    }

    pub(crate) fn snapshot(&self, config: &AgentManagerConfig) -> ManagerMetrics {
        let inner = self.inner.lock();
        let avg_spawn_ms = avg(inner.spawn_ms_sum, inner.spawn_count);
        let avg_inference_ms = avg(inner.inference_ms_sum, inner.inference_count);
        let health_score = health_score(avg_spawn_ms, avg_inference_ms, inner.memory_usage, config);
        ManagerMetrics {
            total_spawned: inner.total_spawned,
            avg_spawn_ms,
            avg_inference_ms,
            memory_usage: inner.memory_usage,
            active_learning_tasks: inner.active_learning_tasks,
            health_score,
        }
    }
}

fn avg(sum: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

const SPAWN_TARGET_MS: f64 = 12.0;
const MAX_PENALTY: f64 = 30.0;

fn health_score(
    avg_spawn_ms: f64,
    avg_inference_ms: f64,
    memory_usage: usize,
    config: &AgentManagerConfig,
) -> u8 {
    let mut score = 100.0_f64;

    if avg_spawn_ms > SPAWN_TARGET_MS {
        let over = (avg_spawn_ms - SPAWN_TARGET_MS) / SPAWN_TARGET_MS;
        score -= (over * 20.0).min(MAX_PENALTY);
    }

    let inference_target = config.inference_timeout.as_secs_f64() * 1000.0;
    if inference_target > 0.0 && avg_inference_ms > inference_target {
        let over = (avg_inference_ms - inference_target) / inference_target;
        score -= (over * 20.0).min(MAX_PENALTY);
    }

    let bound = config.max_agents as f64 * config.memory_limit_per_agent as f64;
    if bound > 0.0 {
        let threshold = 0.8 * bound;
        let used = memory_usage as f64;
        if used > threshold {
            let over = (used - threshold) / (bound - threshold).max(1.0);
            score -= (over * 20.0).min(MAX_PENALTY);
        }
    }

    score.clamp(0.0, 100.0) as u8
}
