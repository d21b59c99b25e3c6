//! RocksDB-backed `PersistenceStore`, for restart durability.

use crate::{AgentRecord, EventRecord, PersistenceError, PersistenceStore, Result};
use neuromesh_core::AgentId;
use rocksdb::{ColumnFamilyDescriptor, Options, DB};
use std::path::PathBuf;

const CF_AGENTS: &str = "agents";
const CF_WEIGHTS: &str = "weights";
const CF_EVENTS: &str = "events";

/// Configuration for the RocksDB persistence backend.
#[derive(Debug, Clone)]
pub struct RocksConfig {
    /// Directory the database lives in.
    pub path: PathBuf,
    /// Enable LZ4 block compression.
    pub compression_enabled: bool,
}

impl Default for RocksConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/persistence"),
            compression_enabled: true,
        }
    }
}

/// Durable `PersistenceStore` backed by RocksDB.
///
/// `agents` and `weights` column families hold one row per id, overwritten
/// on every save (last-writer-wins). `events` holds one row per
/// `(agent_id, sequence)` so the full append-only log survives restarts; on
/// restart the newest row per id reconstructs the current agent set, per the
/// integrity requirement on the persistent state layout.
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Opens (creating if absent) a RocksDB store at `config.path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: &RocksConfig) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        if config.compression_enabled {
            opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        }

        let cfs = [CF_AGENTS, CF_WEIGHTS, CF_EVENTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()));
        let db = DB::open_cf_descriptors(&opts, &config.path, cfs)
            .map_err(|e| PersistenceError::Backend(e.to_string()))?;
        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| PersistenceError::Backend(format!("missing column family {name}")))
    }
}

impl PersistenceStore for RocksStore {
    fn save_agent(&self, id: AgentId, record: AgentRecord) -> Result<()> {
        let cf = self.cf(CF_AGENTS)?;
        let bytes = serde_json::to_vec(&record)?;
        self.db
            .put_cf(cf, id.to_string(), bytes)
            .map_err(|e| PersistenceError::Backend(e.to_string()))
    }

    fn load_agent(&self, id: AgentId) -> Result<Option<AgentRecord>> {
        let cf = self.cf(CF_AGENTS)?;
        match self
            .db
            .get_cf(cf, id.to_string())
            .map_err(|e| PersistenceError::Backend(e.to_string()))?
        {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn save_weights(&self, id: AgentId, bytes: Vec<u8>) -> Result<()> {
        let cf = self.cf(CF_WEIGHTS)?;
        self.db
            .put_cf(cf, id.to_string(), bytes)
            .map_err(|e| PersistenceError::Backend(e.to_string()))
    }

    fn load_weights(&self, id: AgentId) -> Result<Option<Vec<u8>>> {
        let cf = self.cf(CF_WEIGHTS)?;
        self.db
            .get_cf(cf, id.to_string())
            .map_err(|e| PersistenceError::Backend(e.to_string()))
    }

    fn append_event(&self, event: EventRecord) -> Result<()> {
        let cf = self.cf(CF_EVENTS)?;
        let key = format!("{}:{}", event.agent_id, event.timestamp.as_millis());
        let bytes = serde_json::to_vec(&event)?;
        self.db
            .put_cf(cf, key, bytes)
            .map_err(|e| PersistenceError::Backend(e.to_string()))
    }

    fn events_for(&self, id: AgentId) -> Result<Vec<EventRecord>> {
        let cf = self.cf(CF_EVENTS)?;
        let prefix = format!("{id}:");
        let mut events = Vec::new();
        let iter = self
            .db
            .prefix_iterator_cf(cf, prefix.as_bytes());
        for item in iter {
            let (_, value) = item.map_err(|e| PersistenceError::Backend(e.to_string()))?;
            events.push(serde_json::from_slice(&value)?);
        }
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neuromesh_core::Timestamp;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn rocks_store_persists_agent_record() {
        let dir = tempdir().unwrap();
        let config = RocksConfig {
            path: dir.path().to_path_buf(),
            compression_enabled: true,
        };
        let store = RocksStore::open(&config).unwrap();
        let id = AgentId::generate();
        store
            .save_agent(
                id,
                AgentRecord {
                    config: json!({"network_kind": "MLP"}),
                    last_state: "Active".into(),
                    updated_at: Timestamp::now(),
                },
            )
            .unwrap();
        assert_eq!(store.load_agent(id).unwrap().unwrap().last_state, "Active");
    }
}
