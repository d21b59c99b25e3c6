//! Dispatches inbound Transport messages to the subsystem that owns their
//! kind: `AgentCoordination` to the Agent Manager, `Consensus` to the
//! Consensus Engine, `NeuralSync` to the local weights store.

use crate::application::CoordinatorApplication;
use neuromesh_agent::AgentManager;
use neuromesh_consensus::ConsensusEngine;
use neuromesh_core::{AgentId, NodeId};
use neuromesh_p2p::MessageSink;
use neuromesh_persistence::PersistenceStore;
use neuromesh_protocol::{Message, MessageKind};
use serde::Deserialize;
use std::sync::Arc;

/// An `AgentCoordination` payload: a remote agent lifecycle request applied
/// directly, outside of consensus (distributed spawn/terminate instead goes
/// through a `ConsensusMessage::Transaction` on the `Consensus` kind).
#[derive(Debug, Deserialize)]
struct AgentCoordinationPayload {
    kind: String,
    agent_id: AgentId,
    #[serde(default)]
    #[allow(dead_code)]
    source_node: Option<NodeId>,
}

/// A `NeuralSync` payload: fire-and-forget inference/weight broadcast.
#[derive(Debug, Deserialize)]
struct NeuralSyncPayload {
    kind: String,
    agent_id: AgentId,
    #[serde(default)]
    weights: Option<Vec<u8>>,
}

/// Receives messages `Transport` routes outside itself and hands them to the
/// owning subsystem. Consensus and agent-coordination dispatch spawn a
/// detached task since `MessageSink::handle` is synchronous but applying the
/// message is not.
pub struct CoordinatorSink {
    agent_manager: Arc<AgentManager>,
    consensus: Option<(Arc<ConsensusEngine>, Arc<CoordinatorApplication>)>,
    persistence: Option<Arc<dyn PersistenceStore>>,
}

impl CoordinatorSink {
    /// Creates a sink bound to `agent_manager`, optionally wired to a
    /// consensus engine and a persistence backend.
    #[must_use]
    pub fn new(
        agent_manager: Arc<AgentManager>,
        consensus: Option<(Arc<ConsensusEngine>, Arc<CoordinatorApplication>)>,
        persistence: Option<Arc<dyn PersistenceStore>>,
    ) -> Self {
        Self {
            agent_manager,
            consensus,
            persistence,
        }
    }

    fn handle_agent_coordination(&self, message: Message) {
        let payload: AgentCoordinationPayload = match serde_json::from_value(message.payload) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "dropping undecodable agent-coordination payload");
                return;
            }
        };

        match payload.kind.as_str() {
            "agent_terminate" => {
                let agent_manager = Arc::clone(&self.agent_manager);
                tokio::spawn(async move {
                    agent_manager.terminate(payload.agent_id).await;
                });
            }
            other => {
                tracing::debug!(kind = other, agent_id = %payload.agent_id, "agent-coordination kind has no local effect");
            }
        }
    }

    fn handle_consensus(&self, message: Message) {
        let Some((consensus, app)) = self.consensus.clone() else {
            tracing::debug!("dropping consensus message: consensus is not enabled on this node");
            return;
        };
        let consensus_message = match serde_json::from_value(message.payload) {
            Ok(message) => message,
            Err(err) => {
                tracing::warn!(error = %err, "dropping undecodable consensus message");
                return;
            }
        };
        tokio::spawn(async move {
            if let Err(err) = consensus.handle_message(consensus_message, &app).await {
                tracing::warn!(error = %err, "failed to apply consensus message");
            }
        });
    }

    fn handle_neural_sync(&self, message: Message) {
        let Some(persistence) = self.persistence.clone() else {
            return;
        };
        let payload: NeuralSyncPayload = match serde_json::from_value(message.payload) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::warn!(error = %err, "dropping undecodable neural-sync payload");
                return;
            }
        };
        if payload.kind != "weights" {
            return;
        }
        let Some(weights) = payload.weights else { return };
        if let Err(err) = persistence.save_weights(payload.agent_id, weights) {
            tracing::warn!(agent_id = %payload.agent_id, error = %err, "failed to persist synced weights");
        }
    }
}

impl MessageSink for CoordinatorSink {
    fn handle(&self, _from: NodeId, message: Message) {
        match message.kind {
            MessageKind::AgentCoordination => self.handle_agent_coordination(message),
            MessageKind::Consensus => self.handle_consensus(message),
            MessageKind::NeuralSync => self.handle_neural_sync(message),
            MessageKind::Heartbeat | MessageKind::Direct | MessageKind::Broadcast => {}
        }
    }
}
