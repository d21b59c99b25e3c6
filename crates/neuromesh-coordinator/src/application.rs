//! The downstream hook that applies finalized consensus transactions to
//! local mesh state: agent spawn/terminate go to the Agent Manager,
//! task/resource/state transactions are recorded as an audit trail.

use async_trait::async_trait;
use neuromesh_agent::{AgentManager, AgentSpawnConfig};
use neuromesh_backend::NetworkConfig;
use neuromesh_consensus::{ConsensusApplication, FinalizedBlock, Result, Transaction};
use neuromesh_persistence::{EventRecord, PersistenceStore};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Applies committed transactions to the Agent Manager (and, where a
/// transaction has no dedicated agent-manager state, to the persistence
/// event log as an audit trail).
pub struct CoordinatorApplication {
    agent_manager: Arc<AgentManager>,
    persistence: Option<Arc<dyn PersistenceStore>>,
    height: AtomicU64,
}

impl CoordinatorApplication {
    /// Creates an application bound to `agent_manager`, optionally recording
    /// transactions with no dedicated state (`TaskAssign`, `ResourceAllocate`,
    /// `StateUpdate`) to `persistence`.
    #[must_use]
    pub fn new(agent_manager: Arc<AgentManager>, persistence: Option<Arc<dyn PersistenceStore>>) -> Self {
        Self {
            agent_manager,
            persistence,
            height: AtomicU64::new(0),
        }
    }

    fn record(&self, agent_id: neuromesh_core::AgentId, kind: &str, payload: serde_json::Value) {
        let Some(store) = &self.persistence else { return };
        let event = EventRecord {
            agent_id,
            event_kind: kind.to_string(),
            payload,
            timestamp: neuromesh_core::Timestamp::now(),
        };
        if let Err(err) = store.append_event(event) {
            tracing::warn!(%agent_id, error = %err, "failed to record committed transaction");
        }
    }

    async fn apply(&self, transaction: &Transaction) {
        match transaction {
            Transaction::AgentSpawn { payload, .. } => {
                let network: NetworkConfig = match serde_json::from_slice(&payload.architecture) {
                    Ok(network) => network,
                    Err(err) => {
                        tracing::warn!(agent_id = %payload.agent_id, error = %err, "committed AgentSpawn carried an undecodable architecture");
                        return;
                    }
                };
                let config = AgentSpawnConfig {
                    network,
                    metadata: serde_json::json!({}),
                    agent_id: Some(payload.agent_id),
                };
                if let Err(err) = self.agent_manager.spawn(config).await {
                    tracing::warn!(agent_id = %payload.agent_id, error = %err, "failed to apply committed AgentSpawn");
                }
            }
            Transaction::AgentTerminate { payload, .. } => {
                self.agent_manager.terminate(payload.agent_id).await;
                self.record(payload.agent_id, "agent_terminate_reason", serde_json::json!({"reason": payload.reason}));
            }
            Transaction::TaskAssign { payload, .. } => {
                self.record(payload.agent_id, "task_assigned", serde_json::json!({"task": payload.task}));
            }
            Transaction::ResourceAllocate { payload, .. } => {
                self.record(
                    payload.agent_id,
                    "resource_allocated",
                    serde_json::json!({"resource": payload.resource, "amount": payload.amount}),
                );
            }
            Transaction::StateUpdate { payload, .. } => {
                if let Some(store) = &self.persistence {
                    if let Err(err) = store.save_weights(payload.agent_id, payload.state.clone()) {
                        tracing::warn!(agent_id = %payload.agent_id, error = %err, "failed to persist committed StateUpdate");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ConsensusApplication for CoordinatorApplication {
    async fn on_block_finalized(&self, block: &FinalizedBlock) -> Result<()> {
        for transaction in &block.block.transactions {
            self.apply(transaction).await;
        }
        self.height.store(block.height(), Ordering::SeqCst);
        Ok(())
    }

    async fn compute_state_root(&self, transactions: &[Transaction]) -> Result<[u8; 32]> {
        let mut hasher = Sha256::new();
        for transaction in transactions {
            hasher.update(transaction.id().as_bytes());
        }
        Ok(hasher.finalize().into())
    }

    async fn verify_transaction(&self, _transaction: &Transaction) -> Result<()> {
        Ok(())
    }

    fn current_height(&self) -> u64 {
        self.height.load(Ordering::SeqCst)
    }
}
