//! The persistence contract and its in-memory implementation.

use crate::Result;
use neuromesh_core::{AgentId, Timestamp};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The last known durable record for an agent: its spawn config and last observed state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    /// Opaque, caller-defined spawn configuration (network kind, architecture, ...).
    pub config: Value,
    /// The last observed operational state, as a string (`"Active"`, `"Learning"`, ...).
    pub last_state: String,
    /// When this record was last written.
    pub updated_at: Timestamp,
}

/// A single append-only event log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// The agent this event concerns.
    pub agent_id: AgentId,
    /// A caller-defined event kind (`"spawned"`, `"terminated"`, `"inference_timeout"`, ...).
    pub event_kind: String,
    /// Opaque event payload.
    pub payload: Value,
    /// When the event was recorded.
    pub timestamp: Timestamp,
}

/// Durable record of agent config/state, weight blobs, and an event log.
///
/// `save_*` operations are idempotent last-writer-wins; `load_*` operations
/// return the most recent value or `None` ("Absent" in spec terms).
pub trait PersistenceStore: Send + Sync {
    /// Persists (or overwrites) the config/state record for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend failed to durably write the record.
    fn save_agent(&self, id: AgentId, record: AgentRecord) -> Result<()>;

    /// Loads the most recently saved record for `id`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend failed to read.
    fn load_agent(&self, id: AgentId) -> Result<Option<AgentRecord>>;

    /// Persists (or overwrites) the weights blob for `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend failed to durably write the blob.
    fn save_weights(&self, id: AgentId, bytes: Vec<u8>) -> Result<()>;

    /// Loads the most recently saved weights blob for `id`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend failed to read.
    fn load_weights(&self, id: AgentId) -> Result<Option<Vec<u8>>>;

    /// Appends an event to the durable log.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend failed to durably write the event.
    fn append_event(&self, event: EventRecord) -> Result<()>;

    /// Returns all events recorded for `id`, in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend failed to read.
    fn events_for(&self, id: AgentId) -> Result<Vec<EventRecord>>;
}

/// An in-memory `PersistenceStore`. Durable only for the lifetime of the process;
/// used as the default backend and in tests.
#[derive(Default)]
pub struct MemoryStore {
    agents: RwLock<HashMap<AgentId, AgentRecord>>,
    weights: RwLock<HashMap<AgentId, Vec<u8>>>,
    events: RwLock<HashMap<AgentId, Vec<EventRecord>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistenceStore for MemoryStore {
    fn save_agent(&self, id: AgentId, record: AgentRecord) -> Result<()> {
        self.agents.write().insert(id, record);
        Ok(())
    }

    fn load_agent(&self, id: AgentId) -> Result<Option<AgentRecord>> {
        Ok(self.agents.read().get(&id).cloned())
    }

    fn save_weights(&self, id: AgentId, bytes: Vec<u8>) -> Result<()> {
        self.weights.write().insert(id, bytes);
        Ok(())
    }

    fn load_weights(&self, id: AgentId) -> Result<Option<Vec<u8>>> {
        Ok(self.weights.read().get(&id).cloned())
    }

    fn append_event(&self, event: EventRecord) -> Result<()> {
        self.events.write().entry(event.agent_id).or_default().push(event);
        Ok(())
    }

    fn events_for(&self, id: AgentId) -> Result<Vec<EventRecord>> {
        Ok(self.events.read().get(&id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> AgentRecord {
        AgentRecord {
            config: json!({"network_kind": "MLP"}),
            last_state: "Active".into(),
            updated_at: Timestamp::now(),
        }
    }

    #[test]
    fn save_then_load_agent_roundtrips() {
        let store = MemoryStore::new();
        let id = AgentId::generate();
        store.save_agent(id, record()).unwrap();
        let loaded = store.load_agent(id).unwrap().unwrap();
        assert_eq!(loaded.last_state, "Active");
    }

    #[test]
    fn load_agent_absent_returns_none() {
        let store = MemoryStore::new();
        assert!(store.load_agent(AgentId::generate()).unwrap().is_none());
    }

    #[test]
    fn save_agent_is_last_writer_wins() {
        let store = MemoryStore::new();
        let id = AgentId::generate();
        store.save_agent(id, record()).unwrap();
        let mut second = record();
        second.last_state = "Terminating".into();
        store.save_agent(id, second).unwrap();
        assert_eq!(store.load_agent(id).unwrap().unwrap().last_state, "Terminating");
    }

    #[test]
    fn weights_roundtrip() {
        let store = MemoryStore::new();
        let id = AgentId::generate();
        store.save_weights(id, vec![1, 2, 3]).unwrap();
        assert_eq!(store.load_weights(id).unwrap().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn events_append_in_order() {
        let store = MemoryStore::new();
        let id = AgentId::generate();
        for kind in ["spawned", "inference", "terminated"] {
            store
                .append_event(EventRecord {
                    agent_id: id,
                    event_kind: kind.into(),
                    payload: json!({}),
                    timestamp: Timestamp::now(),
                })
                .unwrap();
        }
        let events = store.events_for(id).unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.event_kind.as_str()).collect();
        assert_eq!(kinds, vec!["spawned", "inference", "terminated"]);
    }
}
