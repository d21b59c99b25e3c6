//! The Agent Manager: owns every agent's network handle and state, and is
//! the only thing allowed to mutate an agent's fields.

use crate::config::{AgentManagerConfig, AgentSpawnConfig};
use crate::error::{AgentError, Result};
use crate::metrics::{ManagerMetrics, Metrics};
use crate::record::AgentSnapshot;
use crate::state::AgentState;
use neuromesh_backend::{NetworkHandle, NetworkKind, NumericBackend, Sample, TrainingOutcome};
use neuromesh_core::{AgentId, Timestamp};
use neuromesh_persistence::{AgentRecord, EventRecord, PersistenceStore};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

struct AgentEntry {
    state: AgentState,
    handle: NetworkHandle,
    metadata: Value,
    memory_bytes: usize,
    network_kind: NetworkKind,
    created_at: Timestamp,
    last_active: Timestamp,
    total_inferences: u64,
    inference_ms_sum: f64,
    learning_progress: f32,
    connection_strength: f32,
}

impl AgentEntry {
    fn avg_inference_ms(&self) -> f64 {
        if self.total_inferences == 0 {
            0.0
        } else {
            self.inference_ms_sum / self.total_inferences as f64
        }
    }

    fn snapshot(&self, id: AgentId) -> AgentSnapshot {
        AgentSnapshot {
            id,
            state: self.state,
            network_kind: self.network_kind,
            created_at: self.created_at,
            last_active: self.last_active,
            memory_usage_bytes: self.memory_bytes,
            total_inferences: self.total_inferences,
            avg_inference_ms: self.avg_inference_ms(),
            learning_progress: self.learning_progress,
            connection_strength: self.connection_strength,
        }
    }
}

/// Owns the full set of live agents: their state, their backend network
/// handle, and derived metrics. No other crate may mutate an agent's fields.
pub struct AgentManager {
    backend: Arc<dyn NumericBackend>,
    persistence: Option<Arc<dyn PersistenceStore>>,
    config: AgentManagerConfig,
    agents: RwLock<HashMap<AgentId, Mutex<AgentEntry>>>,
    metrics: Metrics,
}

impl AgentManager {
    /// Creates a manager bound to `backend`, with an optional durable store.
    #[must_use]
    pub fn new(backend: Arc<dyn NumericBackend>, config: AgentManagerConfig) -> Self {
        Self {
            backend,
            persistence: None,
            config,
            agents: RwLock::new(HashMap::new()),
            metrics: Metrics::default(),
        }
    }

    /// Attaches a persistence backend; failures to persist are logged but
    /// never fail the in-memory operation.
    #[must_use]
    pub fn with_persistence(mut self, store: Arc<dyn PersistenceStore>) -> Self {
        self.persistence = Some(store);
        self
    }

    /// Allocates a network and registers a new `Active` agent.
    ///
    /// # Errors
    ///
    /// `CapacityExceeded` if `active count >= max_agents`; `Backend` if
    /// network allocation fails.
    pub async fn spawn(&self, config: AgentSpawnConfig) -> Result<AgentId> {
        if let Some(id) = config.agent_id {
            if self.agents.read().contains_key(&id) {
                return Ok(id);
            }
        }

        let active = self.agents.read().len();
        if active >= self.config.max_agents {
            return Err(AgentError::CapacityExceeded {
                active,
                max_agents: self.config.max_agents,
            });
        }

        let started = Instant::now();
        let bytes = config.network.element_count() * std::mem::size_of::<f32>();
        let backend = Arc::clone(&self.backend);
        let network_config = config.network.clone();
        let handle = tokio::task::spawn_blocking(move || backend.allocate_network(&network_config))
            .await
            .expect("allocate_network task panicked")?;

        let id = config.agent_id.unwrap_or_else(AgentId::generate);
        let now = Timestamp::now();
        self.agents.write().insert(
            id,
            Mutex::new(AgentEntry {
                state: AgentState::Active,
                handle,
                metadata: config.metadata.clone(),
                memory_bytes: bytes,
                network_kind: config.network.network_kind,
                created_at: now,
                last_active: now,
                total_inferences: 0,
                inference_ms_sum: 0.0,
                learning_progress: 0.0,
                connection_strength: 0.0,
            }),
        );

        let elapsed = started.elapsed();
        self.metrics.record_spawn(elapsed.as_secs_f64() * 1000.0, bytes);
        if elapsed > self.config.spawn_timeout {
            tracing::warn!(agent_id = %id, elapsed_ms = elapsed.as_millis(), "spawn exceeded target budget");
        }

        self.persist_agent(id, AgentState::Active, &config.metadata);
        self.append_event(id, "spawned", Value::Null);
        Ok(id)
    }

    /// Runs a forward pass, bounded by `inference_timeout`.
    ///
    /// # Errors
    ///
    /// `NotFound` if `agent_id` is unknown, `Timeout` if the deadline lapses
    /// (the agent remains `Active`), or `Backend` on a shape mismatch.
    pub async fn run_inference(&self, agent_id: AgentId, inputs: Vec<f32>) -> Result<Vec<f32>> {
        let handle = {
            let agents = self.agents.read();
            let entry = agents.get(&agent_id).ok_or(AgentError::NotFound(agent_id))?;
            entry.lock().handle
        };

        let backend = Arc::clone(&self.backend);
        let started = Instant::now();
        let task = tokio::task::spawn_blocking(move || backend.forward(handle, &inputs));

        match tokio::time::timeout(self.config.inference_timeout, task).await {
            Ok(joined) => {
                let output = joined.expect("forward task panicked")?;
                let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.metrics.record_inference(elapsed_ms);
                if let Some(entry) = self.agents.read().get(&agent_id) {
                    let mut entry = entry.lock();
                    entry.total_inferences += 1;
                    entry.inference_ms_sum += elapsed_ms;
                    entry.last_active = Timestamp::now();
                }
                Ok(output)
            }
            Err(_) => Err(AgentError::Timeout(self.config.inference_timeout)),
        }
    }

    /// Trains an agent for up to `epochs` rounds, transitioning
    /// `Active -> Learning -> Active`.
    ///
    /// # Errors
    ///
    /// `NotFound` if unknown, `NotActive` if not currently `Active`, or
    /// `Backend` on a shape mismatch.
    pub async fn train(
        &self,
        agent_id: AgentId,
        samples: Vec<Sample>,
        epochs: u32,
    ) -> Result<TrainingOutcome> {
        let handle = {
            let agents = self.agents.read();
            let entry = agents.get(&agent_id).ok_or(AgentError::NotFound(agent_id))?;
            let mut entry = entry.lock();
            if entry.state != AgentState::Active {
                return Err(AgentError::NotActive {
                    agent_id,
                    state: entry.state.to_string(),
                });
            }
            entry.state = AgentState::Learning;
            entry.handle
        };

        self.metrics.learning_started();
        let backend = Arc::clone(&self.backend);
        let outcome = tokio::task::spawn_blocking(move || backend.train(handle, &samples, epochs))
            .await
            .expect("train task panicked");
        self.metrics.learning_finished();

        let agents = self.agents.read();
        if let Some(entry) = agents.get(&agent_id) {
            let mut entry = entry.lock();
            entry.state = AgentState::Active;
            if let Ok(outcome) = &outcome {
                entry.learning_progress = (outcome.convergence_epoch as f32 / epochs.max(1) as f32).clamp(0.0, 1.0);
            }
            entry.last_active = Timestamp::now();
        }
        drop(agents);

        let outcome = outcome?;
        self.append_event(
            agent_id,
            "trained",
            serde_json::json!({
                "final_accuracy": outcome.final_accuracy,
                "convergence_epoch": outcome.convergence_epoch,
            }),
        );
        Ok(outcome)
    }

    /// Blends `source_id`'s weights into every target in `target_ids`.
    /// All-or-nothing: if cross-learning is disabled or any id is missing,
    /// no target is mutated.
    ///
    /// # Errors
    ///
    /// `Disabled` if cross-learning is off, `NotFound` if any id is missing.
    pub async fn share_knowledge(
        &self,
        source_id: AgentId,
        target_ids: &[AgentId],
        blend: Option<f32>,
    ) -> Result<()> {
        if !self.config.cross_learning_enabled {
            return Err(AgentError::Disabled);
        }
        let blend = blend.unwrap_or(self.config.default_blend);

        let mut sorted_targets = target_ids.to_vec();
        sorted_targets.sort();

        let (source_handle, target_handles) = {
            let agents = self.agents.read();
            let source_handle = agents
                .get(&source_id)
                .ok_or(AgentError::NotFound(source_id))?
                .lock()
                .handle;
            let mut target_handles = Vec::with_capacity(sorted_targets.len());
            for id in &sorted_targets {
                let handle = agents.get(id).ok_or(AgentError::NotFound(*id))?.lock().handle;
                target_handles.push((*id, handle));
            }
            (source_handle, target_handles)
        };

        let backend = Arc::clone(&self.backend);
        let bytes = {
            let backend = Arc::clone(&backend);
            tokio::task::spawn_blocking(move || backend.serialize(source_handle))
                .await
                .expect("serialize task panicked")?
        };

        for (id, handle) in target_handles {
            let backend = Arc::clone(&backend);
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || backend.deserialize_into(handle, &bytes, blend))
                .await
                .expect("deserialize_into task panicked")?;
            if let Some(entry) = self.agents.read().get(&id) {
                let mut entry = entry.lock();
                entry.connection_strength =
                    (entry.connection_strength + blend * (1.0 - entry.connection_strength)).clamp(0.0, 1.0);
                entry.last_active = Timestamp::now();
            }
            self.append_event(id, "knowledge_shared", serde_json::json!({"source": source_id.to_string(), "blend": blend}));
        }
        Ok(())
    }

    /// Idempotently terminates an agent: persists final state, releases its
    /// network, and removes the record. No error if the agent does not exist.
    pub async fn terminate(&self, agent_id: AgentId) {
        let removed = {
            let mut agents = self.agents.write();
            agents.remove(&agent_id)
        };
        let Some(entry) = removed else { return };
        let entry = entry.into_inner();

        self.persist_agent(agent_id, AgentState::Terminating, &entry.metadata);
        self.append_event(agent_id, "terminated", Value::Null);

        let backend = Arc::clone(&self.backend);
        let handle = entry.handle;
        let _ = tokio::task::spawn_blocking(move || backend.release(handle)).await;
        self.metrics.record_release(entry.memory_bytes);
    }

    /// Returns the current aggregate metrics.
    #[must_use]
    pub fn snapshot_metrics(&self) -> ManagerMetrics {
        self.metrics.snapshot(&self.config)
    }

    /// Returns the number of currently active agents.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.agents.read().len()
    }

    /// Returns a read-only snapshot of one agent's record.
    ///
    /// # Errors
    ///
    /// `NotFound` if `agent_id` is unknown.
    pub fn agent_snapshot(&self, agent_id: AgentId) -> Result<AgentSnapshot> {
        let agents = self.agents.read();
        let entry = agents.get(&agent_id).ok_or(AgentError::NotFound(agent_id))?;
        Ok(entry.lock().snapshot(agent_id))
    }

    fn persist_agent(&self, id: AgentId, state: AgentState, metadata: &Value) {
        let Some(store) = &self.persistence else { return };
        let record = AgentRecord {
            config: metadata.clone(),
            last_state: state.to_string(),
            updated_at: Timestamp::now(),
        };
        if let Err(err) = store.save_agent(id, record) {
            tracing::warn!(agent_id = %id, error = %err, "failed to persist agent record");
        }
    }

    fn append_event(&self, id: AgentId, kind: &str, payload: Value) {
        let Some(store) = &self.persistence else { return };
        let event = EventRecord {
            agent_id: id,
            event_kind: kind.to_string(),
            payload,
            timestamp: Timestamp::now(),
        };
        if let Err(err) = store.append_event(event) {
            tracing::warn!(agent_id = %id, error = %err, "failed to append event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_backend::{init_backend, Activation, NetworkConfig, NetworkKind};
    use neuromesh_persistence::MemoryStore;

    fn spawn_config(seed: u64) -> AgentSpawnConfig {
        AgentSpawnConfig {
            network: NetworkConfig {
                network_kind: NetworkKind::Mlp,
                layer_sizes: vec![2, 4, 1],
                seed,
                activation: Activation::Sigmoid,
                learning_rate: 0.5,
            },
            metadata: serde_json::json!({"name": "test-agent"}),
            agent_id: None,
        }
    }

    fn manager() -> AgentManager {
        let backend = init_backend(1_000_000);
        AgentManager::new(backend, AgentManagerConfig::default())
            .with_persistence(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn spawn_then_run_inference() {
        let manager = manager();
        let id = manager.spawn(spawn_config(1)).await.unwrap();
        let output = manager.run_inference(id, vec![0.2, 0.8]).await.unwrap();
        assert_eq!(output.len(), 1);
    }

    #[tokio::test]
    async fn spawn_respects_capacity() {
        let backend = init_backend(1_000_000);
        let mut config = AgentManagerConfig::default();
        config.max_agents = 1;
        let manager = AgentManager::new(backend, config);
        manager.spawn(spawn_config(1)).await.unwrap();
        let result = manager.spawn(spawn_config(2)).await;
        assert!(matches!(result, Err(AgentError::CapacityExceeded { .. })));
    }

    #[tokio::test]
    async fn terminate_is_idempotent() {
        let manager = manager();
        let id = manager.spawn(spawn_config(1)).await.unwrap();
        manager.terminate(id).await;
        manager.terminate(id).await;
        assert!(manager.run_inference(id, vec![0.1, 0.1]).await.is_err());
    }

    #[tokio::test]
    async fn train_transitions_back_to_active() {
        let manager = manager();
        let id = manager.spawn(spawn_config(1)).await.unwrap();
        let samples = vec![Sample {
            inputs: vec![0.1, 0.2],
            targets: vec![0.5],
        }];
        manager.train(id, samples, 10).await.unwrap();
        assert!(manager.run_inference(id, vec![0.1, 0.2]).await.is_ok());
    }

    #[tokio::test]
    async fn share_knowledge_requires_existing_targets() {
        let manager = manager();
        let source = manager.spawn(spawn_config(1)).await.unwrap();
        let missing = AgentId::generate();
        let result = manager.share_knowledge(source, &[missing], None).await;
        assert!(matches!(result, Err(AgentError::NotFound(_))));
    }

    #[tokio::test]
    async fn share_knowledge_blends_targets() {
        let manager = manager();
        let source = manager.spawn(spawn_config(1)).await.unwrap();
        let target = manager.spawn(spawn_config(2)).await.unwrap();
        manager
            .share_knowledge(source, &[target], Some(1.0))
            .await
            .unwrap();
        let source_out = manager.run_inference(source, vec![0.3, 0.6]).await.unwrap();
        let target_out = manager.run_inference(target, vec![0.3, 0.6]).await.unwrap();
        assert_eq!(source_out, target_out);
    }

    #[tokio::test]
    async fn metrics_reflect_spawned_agents() {
        let manager = manager();
        manager.spawn(spawn_config(1)).await.unwrap();
        manager.spawn(spawn_config(2)).await.unwrap();
        let metrics = manager.snapshot_metrics();
        assert_eq!(metrics.total_spawned, 2);
        assert!(metrics.health_score <= 100);
    }

    #[tokio::test]
    async fn total_inferences_is_monotonic_and_reflected_in_snapshot() {
        let manager = manager();
        let id = manager.spawn(spawn_config(1)).await.unwrap();
        manager.run_inference(id, vec![0.1, 0.2]).await.unwrap();
        manager.run_inference(id, vec![0.3, 0.4]).await.unwrap();

        let snapshot = manager.agent_snapshot(id).unwrap();
        assert_eq!(snapshot.total_inferences, 2);
        assert!(snapshot.avg_inference_ms >= 0.0);
        assert_eq!(snapshot.network_kind, neuromesh_backend::NetworkKind::Mlp);
    }

    #[tokio::test]
    async fn share_knowledge_raises_target_connection_strength() {
        let manager = manager();
        let source = manager.spawn(spawn_config(1)).await.unwrap();
        let target = manager.spawn(spawn_config(2)).await.unwrap();
        manager
            .share_knowledge(source, &[target], Some(0.5))
            .await
            .unwrap();
        let snapshot = manager.agent_snapshot(target).unwrap();
        assert!(snapshot.connection_strength > 0.0);
    }

    #[tokio::test]
    async fn agent_snapshot_fails_for_unknown_agent() {
        let manager = manager();
        let result = manager.agent_snapshot(AgentId::generate());
        assert!(matches!(result, Err(AgentError::NotFound(_))));
    }
}
