//! Consensus transactions.
//!
//! A transaction is the unit of mesh-wide coordination: spawning or
//! terminating an agent, assigning a task, allocating a resource, or
//! publishing a state update all go through consensus so every node agrees
//! on the order in which they took effect.

use neuromesh_core::AgentId;
use neuromesh_identity::{SerializablePublicKey, SerializableSignature};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A unique transaction identifier (SHA-256 hash of the transaction's
/// signable bytes plus its signature).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId([u8; 32]);

impl TransactionId {
    /// Creates a transaction ID from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the hex representation.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Creates a transaction ID from a hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_str, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A request to spawn a new neural agent on the mesh.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSpawn {
    /// The agent to create.
    pub agent_id: AgentId,
    /// Serialized network architecture the agent should be initialized with.
    pub architecture: Vec<u8>,
    /// Node the agent should be placed on, if the submitter requests one.
    pub target_node: Option<neuromesh_core::NodeId>,
}

/// A request to terminate a running agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentTerminate {
    /// The agent to terminate.
    pub agent_id: AgentId,
    /// Human-readable reason, recorded for audit.
    pub reason: String,
}

/// A request to assign a task to an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskAssign {
    /// The agent the task is assigned to.
    pub agent_id: AgentId,
    /// Opaque task payload, interpreted by the agent.
    pub task: Vec<u8>,
}

/// A request to allocate a resource quota to an agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceAllocate {
    /// The agent receiving the allocation.
    pub agent_id: AgentId,
    /// Resource name (e.g. `"cpu_ms"`, `"memory_bytes"`).
    pub resource: String,
    /// Amount allocated.
    pub amount: u64,
}

/// A mesh-wide state update, committed for durability and total ordering
/// rather than for immediate routing (compare
/// `neuromesh_protocol::MessageKind::NeuralSync`, which is fire-and-forget
/// and never goes through consensus).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateUpdate {
    /// The agent whose state changed.
    pub agent_id: AgentId,
    /// Opaque state payload.
    pub state: Vec<u8>,
}

/// A consensus transaction: every mesh-wide coordination operation that must
/// be totally ordered across the network.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Transaction {
    /// Spawn a new agent.
    AgentSpawn {
        /// Transaction payload.
        payload: AgentSpawn,
        /// Proposal priority; a leader fills a block with pending
        /// transactions ordered by priority, highest first.
        priority: u8,
        /// Submitter's public key.
        submitter: SerializablePublicKey,
        /// Submitter's signature over the transaction's signable bytes.
        signature: SerializableSignature,
    },
    /// Terminate an existing agent.
    AgentTerminate {
        /// Transaction payload.
        payload: AgentTerminate,
        /// Proposal priority.
        priority: u8,
        /// Submitter's public key.
        submitter: SerializablePublicKey,
        /// Submitter's signature over the transaction's signable bytes.
        signature: SerializableSignature,
    },
    /// Assign a task to an agent.
    TaskAssign {
        /// Transaction payload.
        payload: TaskAssign,
        /// Proposal priority.
        priority: u8,
        /// Submitter's public key.
        submitter: SerializablePublicKey,
        /// Submitter's signature over the transaction's signable bytes.
        signature: SerializableSignature,
    },
    /// Allocate a resource to an agent.
    ResourceAllocate {
        /// Transaction payload.
        payload: ResourceAllocate,
        /// Proposal priority.
        priority: u8,
        /// Submitter's public key.
        submitter: SerializablePublicKey,
        /// Submitter's signature over the transaction's signable bytes.
        signature: SerializableSignature,
    },
    /// Publish a durable state update.
    StateUpdate {
        /// Transaction payload.
        payload: StateUpdate,
        /// Proposal priority.
        priority: u8,
        /// Submitter's public key.
        submitter: SerializablePublicKey,
        /// Submitter's signature over the transaction's signable bytes.
        signature: SerializableSignature,
    },
}

impl Transaction {
    /// Returns the transaction kind as a string, for logging and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Transaction::AgentSpawn { .. } => "agent_spawn",
            Transaction::AgentTerminate { .. } => "agent_terminate",
            Transaction::TaskAssign { .. } => "task_assign",
            Transaction::ResourceAllocate { .. } => "resource_allocate",
            Transaction::StateUpdate { .. } => "state_update",
        }
    }

    /// Returns the ordering priority used when the leader fills a block.
    #[must_use]
    pub fn priority(&self) -> u8 {
        match self {
            Transaction::AgentSpawn { priority, .. }
            | Transaction::AgentTerminate { priority, .. }
            | Transaction::TaskAssign { priority, .. }
            | Transaction::ResourceAllocate { priority, .. }
            | Transaction::StateUpdate { priority, .. } => *priority,
        }
    }

    /// Returns the submitter's public key.
    #[must_use]
    pub fn submitter(&self) -> &SerializablePublicKey {
        match self {
            Transaction::AgentSpawn { submitter, .. }
            | Transaction::AgentTerminate { submitter, .. }
            | Transaction::TaskAssign { submitter, .. }
            | Transaction::ResourceAllocate { submitter, .. }
            | Transaction::StateUpdate { submitter, .. } => submitter,
        }
    }

    /// Returns the submitter's signature.
    #[must_use]
    pub fn signature(&self) -> &SerializableSignature {
        match self {
            Transaction::AgentSpawn { signature, .. }
            | Transaction::AgentTerminate { signature, .. }
            | Transaction::TaskAssign { signature, .. }
            | Transaction::ResourceAllocate { signature, .. }
            | Transaction::StateUpdate { signature, .. } => signature,
        }
    }

    /// The bytes the submitter's signature is computed over: the JSON of
    /// the transaction with the signature field blanked out.
    #[must_use]
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut clone = self.clone();
        match &mut clone {
            Transaction::AgentSpawn { signature, .. }
            | Transaction::AgentTerminate { signature, .. }
            | Transaction::TaskAssign { signature, .. }
            | Transaction::ResourceAllocate { signature, .. }
            | Transaction::StateUpdate { signature, .. } => {
                *signature = SerializableSignature::from_hex(String::new());
            }
        }
        serde_json::to_vec(&clone).expect("transaction serialization should not fail")
    }

    /// Verifies the submitter's signature over [`Transaction::signable_bytes`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConsensusError::InvalidSignature`] if the public key
    /// or signature is malformed, or the signature does not verify.
    pub fn verify_signature(&self) -> crate::Result<()> {
        let public_key = self
            .submitter()
            .to_public_key()
            .map_err(|e| crate::ConsensusError::InvalidSignature(e.to_string()))?;
        let signature = self
            .signature()
            .to_signature()
            .map_err(|e| crate::ConsensusError::InvalidSignature(e.to_string()))?;
        public_key
            .verify(&self.signable_bytes(), &signature)
            .map_err(|e| crate::ConsensusError::InvalidSignature(e.to_string()))
    }

    /// Computes the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        let mut hasher = Sha256::new();
        hasher.update(self.signable_bytes());
        hasher.update(self.signature().as_hex().as_bytes());
        let result = hasher.finalize();
        let mut id = [0u8; 32];
        id.copy_from_slice(&result);
        TransactionId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_identity::Keypair;

    fn signed_spawn(seed: u64, priority: u8) -> Transaction {
        let kp = Keypair::from_seed(seed);
        let payload = AgentSpawn {
            agent_id: AgentId::generate(),
            architecture: vec![1, 2, 3],
            target_node: None,
        };
        let mut tx = Transaction::AgentSpawn {
            payload,
            priority,
            submitter: SerializablePublicKey::from_public_key(&kp.public_key()),
            signature: SerializableSignature::from_hex(String::new()),
        };
        let sig = kp.sign(&tx.signable_bytes());
        if let Transaction::AgentSpawn { signature, .. } = &mut tx {
            *signature = SerializableSignature::from_signature(&sig);
        }
        tx
    }

    #[test]
    fn signature_roundtrips_and_verifies() {
        let tx = signed_spawn(1, 5);
        assert!(tx.verify_signature().is_ok());
    }

    #[test]
    fn tampered_priority_fails_verification() {
        let mut tx = signed_spawn(1, 5);
        if let Transaction::AgentSpawn { priority, .. } = &mut tx {
            *priority = 200;
        }
        assert!(tx.verify_signature().is_err());
    }

    #[test]
    fn id_is_stable_and_kind_matches() {
        let tx = signed_spawn(2, 1);
        assert_eq!(tx.id(), tx.id());
        assert_eq!(tx.kind(), "agent_spawn");
        assert_eq!(tx.priority(), 1);
    }

    #[test]
    fn different_signers_of_same_intent_do_not_collide() {
        let tx_a = signed_spawn(10, 5);
        let tx_b = signed_spawn(11, 5);
        assert_ne!(tx_a.id(), tx_b.id());
    }

    #[test]
    fn transaction_serde_roundtrip_preserves_id() {
        let tx = signed_spawn(3, 7);
        let json = serde_json::to_string(&tx).unwrap();
        let parsed: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx.id(), parsed.id());
    }
}
