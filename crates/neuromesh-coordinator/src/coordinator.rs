//! The `Coordinator`: the single control surface a caller drives instead of
//! touching the Agent Manager, Transport, or Consensus Engine directly.
//!
//! Local-only deployments (`enable_p2p = false`, `enable_consensus = false`)
//! just wrap an `AgentManager`. Turning either flag on wires the matching
//! subsystem in and gives agent lifecycle operations a distributed path:
//! `spawn`/`terminate` can go through consensus instead of applying locally,
//! and `run_inference`/`share_knowledge` can fan their result out to the rest
//! of the mesh as a fire-and-forget `NeuralSync` broadcast.

use crate::application::CoordinatorApplication;
use crate::config::CoordinatorConfig;
use crate::error::{CoordinatorError, Result};
use crate::health::HealthSnapshot;
use crate::sink::CoordinatorSink;
use neuromesh_agent::{AgentManager, AgentSpawnConfig, ManagerMetrics};
use neuromesh_backend::{init_backend, NetworkConfig, Sample, TrainingOutcome};
use neuromesh_consensus::{
    AgentSpawn, AgentTerminate, ConsensusEngine, Mempool, MempoolConfig, Transaction, ValidatorSet,
};
use neuromesh_core::{AgentId, NodeId};
use neuromesh_identity::{Keypair, SerializablePublicKey, SerializableSignature};
use neuromesh_p2p::{InProcessNetwork, Peer, Transport, TransportEvent};
use neuromesh_persistence::{MemoryStore, PersistenceStore};
use neuromesh_protocol::{Message, MessageKind};
use neuromesh_topology::MeshMetrics;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Cross-node neural-sync broadcasts travel at most two hops: originator ->
/// direct peers -> their peers. Wide enough for small meshes without
/// flooding a large one indefinitely.
const NEURAL_SYNC_TTL: u8 = 2;

/// Consensus gossip needs to reach every validator, not just direct peers;
/// a larger budget tolerates a partially-connected mesh.
const CONSENSUS_GOSSIP_TTL: u8 = 6;

fn signed(mut tx: Transaction, keypair: &Keypair) -> Transaction {
    let signature = SerializableSignature::from_signature(&keypair.sign(&tx.signable_bytes()));
    match &mut tx {
        Transaction::AgentSpawn { signature: sig, .. }
        | Transaction::AgentTerminate { signature: sig, .. }
        | Transaction::TaskAssign { signature: sig, .. }
        | Transaction::ResourceAllocate { signature: sig, .. }
        | Transaction::StateUpdate { signature: sig, .. } => *sig = signature,
    }
    tx
}

/// Glues the Agent Manager to an optional Consensus Engine and an optional
/// P2P Transport behind one control surface.
pub struct Coordinator {
    config: CoordinatorConfig,
    keypair: Keypair,
    node_id: NodeId,
    agent_manager: Arc<AgentManager>,
    persistence: Option<Arc<dyn PersistenceStore>>,
    transport: Option<Arc<Transport>>,
    consensus: Option<Arc<ConsensusEngine>>,
    transport_events: Mutex<Option<mpsc::UnboundedReceiver<TransportEvent>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Coordinator {
    /// Builds every enabled subsystem from `config`, wires them together,
    /// and spawns their background tasks (Transport's heartbeat/receive
    /// loops, the consensus round loop, and a forwarder from the consensus
    /// engine's outbound channel onto Transport).
    ///
    /// # Errors
    ///
    /// Returns an error if a configured genesis validator is malformed, or
    /// if the validator set does not satisfy the configured Byzantine fault
    /// tolerance floor.
    pub fn new(config: CoordinatorConfig, keypair: Keypair, network: InProcessNetwork) -> Result<Arc<Self>> {
        let backend = init_backend(config.backend_capacity_elements);
        let mut manager = AgentManager::new(backend, config.agent_manager_config());

        let persistence: Option<Arc<dyn PersistenceStore>> = if config.persistence_enabled {
            Some(Arc::new(MemoryStore::new()))
        } else {
            None
        };
        if let Some(store) = &persistence {
            manager = manager.with_persistence(Arc::clone(store));
        }
        let agent_manager = Arc::new(manager);

        let mut tasks = Vec::new();
        let mut consensus: Option<Arc<ConsensusEngine>> = None;
        let mut application: Option<Arc<CoordinatorApplication>> = None;
        let mut outbound_rx = None;

        if config.enable_consensus {
            let mut validators = ValidatorSet::new();
            for genesis_validator in &config.validator_nodes {
                validators.add(genesis_validator.clone().into_validator()?);
            }
            let mempool = Arc::new(Mempool::new(MempoolConfig {
                consensus_timeout: config.consensus_timeout,
                ..MempoolConfig::default()
            }));
            let (engine, rx) =
                ConsensusEngine::new(config.engine_config(), Some(keypair.clone()), validators, mempool)?;
            let app = Arc::new(CoordinatorApplication::new(Arc::clone(&agent_manager), persistence.clone()));

            tasks.push(tokio::spawn({
                let engine = Arc::clone(&engine);
                let app = Arc::clone(&app);
                async move { engine.run(app).await }
            }));

            consensus = Some(engine);
            application = Some(app);
            outbound_rx = Some(rx);
        }

        let sink_consensus = match (&consensus, &application) {
            (Some(engine), Some(app)) => Some((Arc::clone(engine), Arc::clone(app))),
            _ => None,
        };
        let sink = Arc::new(CoordinatorSink::new(
            Arc::clone(&agent_manager),
            sink_consensus,
            persistence.clone(),
        ));

        let node_id = NodeId::from_public_key_bytes(keypair.public_key().as_bytes());
        let mut transport: Option<Arc<Transport>> = None;
        let mut transport_events = None;

        if config.enable_p2p {
            let (built, inbox, events) = Transport::new(
                keypair.clone(),
                config.transport_config(),
                network,
                vec!["inference".to_string()],
                sink,
            );
            tasks.extend(built.run(inbox));

            let transport_for_resources = Arc::clone(&built);
            let agent_manager_for_resources = Arc::clone(&agent_manager);
            let max_agents = config.max_agents;
            let memory_limit_per_agent = config.memory_limit_per_agent;
            let heartbeat_interval = config.heartbeat_interval;
            tasks.push(tokio::spawn(async move {
                let mut interval = tokio::time::interval(heartbeat_interval);
                loop {
                    interval.tick().await;
                    let metrics = agent_manager_for_resources.snapshot_metrics();
                    let cpu_usage = if max_agents > 0 {
                        metrics.active_learning_tasks as f64 / max_agents as f64
                    } else {
                        0.0
                    };
                    let mem_bound = (max_agents * memory_limit_per_agent) as f64;
                    let mem_usage = if mem_bound > 0.0 {
                        metrics.memory_usage as f64 / mem_bound
                    } else {
                        0.0
                    };
                    transport_for_resources.set_resource_usage(cpu_usage, mem_usage);
                }
            }));

            transport = Some(built);
            transport_events = Some(events);
        }

        if let Some(mut outbound_rx) = outbound_rx {
            let transport_for_forward = transport.clone();
            tasks.push(tokio::spawn(async move {
                while let Some(message) = outbound_rx.recv().await {
                    let Some(transport) = &transport_for_forward else { continue };
                    let payload = match serde_json::to_value(&message) {
                        Ok(payload) => payload,
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to encode outbound consensus message");
                            continue;
                        }
                    };
                    let envelope = Message::new(node_id, None, MessageKind::Consensus, payload, CONSENSUS_GOSSIP_TTL);
                    transport.broadcast(envelope).await;
                }
            }));
        }

        Ok(Arc::new(Self {
            config,
            keypair,
            node_id,
            agent_manager,
            persistence,
            transport,
            consensus,
            transport_events: Mutex::new(transport_events),
            tasks: Mutex::new(tasks),
        }))
    }

    /// This node's mesh identity.
    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// The currently known Transport peer sessions, empty if `enable_p2p` is
    /// off. Intended for a caller driving its own [`neuromesh_topology::Topology`].
    #[must_use]
    pub fn peers(&self) -> Vec<Peer> {
        self.transport.as_ref().map(|t| t.peers()).unwrap_or_default()
    }

    /// The currently known Transport peer sessions paired with their
    /// connection state, empty if `enable_p2p` is off. Intended for a caller
    /// driving its own [`neuromesh_topology::Topology`], which needs both
    /// the peer's self-reported resource telemetry and its connection state.
    #[must_use]
    pub fn peers_with_connections(&self) -> Vec<(Peer, neuromesh_p2p::Connection)> {
        self.transport
            .as_ref()
            .map(|t| t.peers_with_connections())
            .unwrap_or_default()
    }

    /// Takes ownership of this node's Transport event stream (peer
    /// connect/disconnect, broadcast fanout failures), for a caller that
    /// wants to feed a `Topology` instance. Returns `None` if `enable_p2p` is
    /// off or this has already been taken; callable once.
    pub fn take_transport_events(&self) -> Option<mpsc::UnboundedReceiver<TransportEvent>> {
        self.transport_events.lock().take()
    }

    /// Dials a peer at `address`, opening a Transport session once it
    /// becomes reachable on the shared network.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::P2pDisabled`] if `enable_p2p` is off, or
    /// the underlying [`CoordinatorError::Transport`] if the peer never
    /// becomes reachable within `network_timeout`.
    pub async fn connect(
        &self,
        address: std::net::SocketAddr,
        public_key: neuromesh_identity::PublicKey,
    ) -> Result<NodeId> {
        let transport = self.transport.as_ref().ok_or(CoordinatorError::P2pDisabled)?;
        Ok(transport.connect(address, public_key).await?)
    }

    /// Spawns a new agent. When `distributed` is true the spawn is committed
    /// through consensus instead of applied directly: the agent id is
    /// generated up front and embedded in the transaction, so every node
    /// that applies the same committed block converges on the same id.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::ConsensusDisabled`] if `distributed` is
    /// requested but consensus is not enabled, or propagates the Agent
    /// Manager's / Consensus Engine's own errors.
    pub async fn spawn(&self, network: NetworkConfig, metadata: serde_json::Value, distributed: bool) -> Result<AgentId> {
        if distributed {
            let consensus = self.consensus.as_ref().ok_or(CoordinatorError::ConsensusDisabled)?;
            let agent_id = AgentId::generate();
            let architecture = serde_json::to_vec(&network)?;
            let tx = signed(
                Transaction::AgentSpawn {
                    payload: AgentSpawn {
                        agent_id,
                        architecture,
                        target_node: None,
                    },
                    priority: 5,
                    submitter: SerializablePublicKey::from_public_key(&self.keypair.public_key()),
                    signature: SerializableSignature::from_hex(String::new()),
                },
                &self.keypair,
            );
            consensus.submit_transaction(tx)?;
            Ok(agent_id)
        } else {
            let config = AgentSpawnConfig {
                network,
                metadata,
                agent_id: None,
            };
            Ok(self.agent_manager.spawn(config).await?)
        }
    }

    /// Terminates an agent, locally or via consensus.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::ConsensusDisabled`] if `distributed` is
    /// requested but consensus is not enabled.
    pub async fn terminate(&self, agent_id: AgentId, distributed: bool) -> Result<()> {
        if distributed {
            let consensus = self.consensus.as_ref().ok_or(CoordinatorError::ConsensusDisabled)?;
            let tx = signed(
                Transaction::AgentTerminate {
                    payload: AgentTerminate {
                        agent_id,
                        reason: "requested".to_string(),
                    },
                    priority: 5,
                    submitter: SerializablePublicKey::from_public_key(&self.keypair.public_key()),
                    signature: SerializableSignature::from_hex(String::new()),
                },
                &self.keypair,
            );
            consensus.submit_transaction(tx)?;
            Ok(())
        } else {
            self.agent_manager.terminate(agent_id).await;
            Ok(())
        }
    }

    /// Runs inference, optionally broadcasting a fire-and-forget
    /// `NeuralSync` notification to the rest of the mesh afterwards.
    ///
    /// # Errors
    ///
    /// Propagates the Agent Manager's errors (unknown agent, timeout, shape
    /// mismatch).
    pub async fn run_inference(&self, agent_id: AgentId, inputs: Vec<f32>, broadcast: bool) -> Result<Vec<f32>> {
        let output = self.agent_manager.run_inference(agent_id, inputs).await?;
        if broadcast {
            self.broadcast_neural_sync("inference", agent_id, None).await;
        }
        Ok(output)
    }

    /// Trains an agent.
    ///
    /// # Errors
    ///
    /// Propagates the Agent Manager's errors (unknown agent, not active,
    /// shape mismatch).
    pub async fn train(&self, agent_id: AgentId, samples: Vec<Sample>, epochs: u32) -> Result<TrainingOutcome> {
        Ok(self.agent_manager.train(agent_id, samples, epochs).await?)
    }

    /// Blends `source_id`'s weights into every agent in `target_ids`,
    /// optionally broadcasting the blended weights to the rest of the mesh.
    ///
    /// # Errors
    ///
    /// Propagates the Agent Manager's errors (cross-learning disabled,
    /// unknown agent).
    pub async fn share_knowledge(
        &self,
        source_id: AgentId,
        target_ids: &[AgentId],
        blend: Option<f32>,
        broadcast: bool,
    ) -> Result<()> {
        self.agent_manager.share_knowledge(source_id, target_ids, blend).await?;
        if broadcast {
            self.broadcast_neural_sync("weights", source_id, None).await;
        }
        Ok(())
    }

    /// Returns the Agent Manager's current aggregate metrics.
    #[must_use]
    pub fn snapshot_metrics(&self) -> ManagerMetrics {
        self.agent_manager.snapshot_metrics()
    }

    /// Returns a read-only snapshot of one agent's record.
    ///
    /// # Errors
    ///
    /// Propagates the Agent Manager's `NotFound` if `agent_id` is unknown.
    pub fn agent_snapshot(&self, agent_id: AgentId) -> Result<neuromesh_agent::AgentSnapshot> {
        Ok(self.agent_manager.agent_snapshot(agent_id)?)
    }

    /// Combines local agent metrics with consensus state and, if the caller
    /// passes one, a `Topology`-computed mesh snapshot (this crate never
    /// owns a `Topology` instance itself).
    #[must_use]
    pub fn snapshot_health(&self, mesh: Option<MeshMetrics>) -> HealthSnapshot {
        let agents = self.agent_manager.snapshot_metrics();
        let (state, height) = match &self.consensus {
            Some(engine) => (Some(engine.state()), Some(engine.finalized_height())),
            None => (None, None),
        };
        HealthSnapshot::new(agents, mesh, state, height)
    }

    /// Stops the consensus engine's state bookkeeping and aborts every
    /// background task this coordinator spawned.
    pub fn shutdown(&self) {
        if let Some(consensus) = &self.consensus {
            consensus.stop();
        }
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }

    /// Fire-and-forget: broadcasts a `NeuralSync` message if Transport is
    /// enabled, otherwise logs and does nothing. Never fails the caller's
    /// already-completed local operation.
    async fn broadcast_neural_sync(&self, kind: &str, agent_id: AgentId, weights: Option<Vec<u8>>) {
        let Some(transport) = &self.transport else {
            tracing::debug!(kind, %agent_id, "skipping neural-sync broadcast: p2p is not enabled on this node");
            return;
        };
        let payload = serde_json::json!({"kind": kind, "agent_id": agent_id, "weights": weights});
        let message = Message::new(self.node_id, None, MessageKind::NeuralSync, payload, NEURAL_SYNC_TTL);
        transport.broadcast(message).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_backend::Activation;
    use neuromesh_consensus::generate_devnet_genesis;

    fn network() -> NetworkConfig {
        NetworkConfig {
            network_kind: neuromesh_backend::NetworkKind::Mlp,
            layer_sizes: vec![2, 4, 1],
            seed: 1,
            activation: Activation::Sigmoid,
            learning_rate: 0.3,
        }
    }

    #[tokio::test]
    async fn local_spawn_and_inference_roundtrip() {
        let coordinator = Coordinator::new(
            CoordinatorConfig::default(),
            Keypair::from_seed(1),
            InProcessNetwork::new(),
        )
        .unwrap();

        let id = coordinator.spawn(network(), serde_json::json!({}), false).await.unwrap();
        let output = coordinator.run_inference(id, vec![0.1, 0.9], false).await.unwrap();
        assert_eq!(output.len(), 1);
    }

    #[tokio::test]
    async fn local_terminate_is_idempotent() {
        let coordinator = Coordinator::new(
            CoordinatorConfig::default(),
            Keypair::from_seed(1),
            InProcessNetwork::new(),
        )
        .unwrap();

        let id = coordinator.spawn(network(), serde_json::json!({}), false).await.unwrap();
        coordinator.terminate(id, false).await.unwrap();
        coordinator.terminate(id, false).await.unwrap();
        assert!(coordinator.run_inference(id, vec![0.1, 0.1], false).await.is_err());
    }

    #[tokio::test]
    async fn distributed_spawn_requires_consensus_enabled() {
        let coordinator = Coordinator::new(
            CoordinatorConfig::default(),
            Keypair::from_seed(1),
            InProcessNetwork::new(),
        )
        .unwrap();

        let result = coordinator.spawn(network(), serde_json::json!({}), true).await;
        assert!(matches!(result, Err(CoordinatorError::ConsensusDisabled)));
    }

    #[tokio::test]
    async fn distributed_spawn_submits_a_signed_transaction() {
        let genesis = generate_devnet_genesis(4);
        let config = CoordinatorConfig {
            enable_consensus: true,
            validator_nodes: genesis.validators.clone(),
            ..CoordinatorConfig::default()
        };

        let coordinator = Coordinator::new(config, Keypair::from_seed(0), InProcessNetwork::new()).unwrap();
        // Submission only requires a valid signature and a non-duplicate id;
        // reaching quorum with a single simulated validator is covered by
        // `neuromesh-consensus`'s own engine tests.
        let agent_id = coordinator.spawn(network(), serde_json::json!({}), true).await.unwrap();
        assert!(!agent_id.is_null());
    }

    #[tokio::test]
    async fn snapshot_health_without_mesh_falls_back_to_agent_score() {
        let coordinator = Coordinator::new(
            CoordinatorConfig::default(),
            Keypair::from_seed(1),
            InProcessNetwork::new(),
        )
        .unwrap();
        let health = coordinator.snapshot_health(None);
        assert_eq!(health.overall, health.agents.health_score);
        assert!(health.mesh.is_none());
        assert!(health.consensus_state.is_none());
    }
}
