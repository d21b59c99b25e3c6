//! # Neuromesh Persistence
//!
//! Optional durable record of `{agent_id -> config + last known state}`,
//! `{agent_id -> latest weights blob}`, and an append-only event log. Failures
//! here are surfaced to the Agent Manager but never abort the in-memory
//! operation: persistence is best-effort with at-least-once semantics.
//!
//! An in-memory backend is always available; a RocksDB-backed implementation
//! is available behind the `rocksdb-backend` feature for process restarts to
//! reconstruct a consistent agent set.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod store;

#[cfg(feature = "rocksdb-backend")]
mod rocksdb_store;

pub use error::{PersistenceError, Result};
pub use store::{AgentRecord, EventRecord, MemoryStore, PersistenceStore};

#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_store::{RocksConfig, RocksStore};
