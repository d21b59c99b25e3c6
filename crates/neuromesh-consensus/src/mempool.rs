//! Transaction mempool for pending transactions.
//!
//! The mempool holds transactions that have been submitted but not yet
//! included in a finalized block, ordered by priority (highest first) so a
//! leader filling a block proposal always reaches for the most important
//! pending work first.

use crate::error::{ConsensusError, Result};
use crate::transaction::{Transaction, TransactionId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Configuration for the mempool.
#[derive(Debug, Clone)]
pub struct MempoolConfig {
    /// Maximum number of transactions in the mempool.
    pub max_transactions: usize,

    /// Maximum time a transaction may sit in the pending pool before it is
    /// discarded unconfirmed.
    pub consensus_timeout: Duration,
}

impl Default for MempoolConfig {
    fn default() -> Self {
        Self {
            max_transactions: 10_000,
            consensus_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
struct PendingTransaction {
    transaction: Transaction,
    added_at: Instant,
    arrival_order: u64,
    propose_count: u32,
}

/// The transaction mempool.
pub struct Mempool {
    config: MempoolConfig,
    transactions: RwLock<HashMap<TransactionId, PendingTransaction>>,
    next_arrival_order: RwLock<u64>,
}

impl Mempool {
    /// Creates a new mempool with the given configuration.
    #[must_use]
    pub fn new(config: MempoolConfig) -> Self {
        Self {
            config,
            transactions: RwLock::new(HashMap::new()),
            next_arrival_order: RwLock::new(0),
        }
    }

    /// Creates a new mempool with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(MempoolConfig::default())
    }

    /// Adds a transaction to the mempool.
    ///
    /// # Errors
    ///
    /// Returns [`ConsensusError::DuplicateTransaction`] if a transaction
    /// with the same ID is already pending.
    pub fn add(&self, transaction: Transaction) -> Result<TransactionId> {
        let id = transaction.id();
        let mut txs = self.transactions.write();

        if txs.contains_key(&id) {
            return Err(ConsensusError::DuplicateTransaction(id.to_hex()));
        }

        if txs.len() >= self.config.max_transactions {
            if let Some(victim) = txs
                .iter()
                .min_by_key(|(_, p)| (p.transaction.priority(), std::cmp::Reverse(p.arrival_order)))
                .map(|(id, _)| *id)
            {
                txs.remove(&victim);
                tracing::debug!(?victim, "evicted lowest-priority transaction at mempool capacity");
            }
        }

        let mut order = self.next_arrival_order.write();
        let arrival_order = *order;
        *order += 1;
        drop(order);

        txs.insert(
            id,
            PendingTransaction {
                transaction,
                added_at: Instant::now(),
                arrival_order,
                propose_count: 0,
            },
        );

        tracing::trace!(?id, "added transaction to mempool");
        Ok(id)
    }

    /// Gets a transaction by ID.
    #[must_use]
    pub fn get(&self, id: &TransactionId) -> Option<Transaction> {
        self.transactions.read().get(id).map(|p| p.transaction.clone())
    }

    /// Checks if a transaction exists in the mempool.
    #[must_use]
    pub fn contains(&self, id: &TransactionId) -> bool {
        self.transactions.read().contains_key(id)
    }

    /// Returns the number of pending transactions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.read().len()
    }

    /// Returns true if the mempool is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transactions.read().is_empty()
    }

    /// Removes a transaction from the mempool.
    pub fn remove(&self, id: &TransactionId) -> Option<Transaction> {
        self.transactions.write().remove(id).map(|p| p.transaction)
    }

    /// Removes multiple transactions from the mempool (called after a block
    /// including them is finalized).
    pub fn remove_batch(&self, ids: &[TransactionId]) {
        let mut txs = self.transactions.write();
        for id in ids {
            txs.remove(id);
        }
        tracing::debug!(count = ids.len(), "removed finalized batch from mempool");
    }

    /// Selects transactions for a block proposal: non-expired transactions
    /// ordered by descending priority (ties broken by arrival order), up to
    /// `max_block_size` bytes of JSON-encoded payload.
    pub fn get_for_proposal(&self, max_block_size: usize) -> Vec<Transaction> {
        let now = Instant::now();
        let mut txs = self.transactions.write();

        let mut candidates: Vec<(TransactionId, u8, u64)> = txs
            .iter()
            .filter(|(_, p)| now.duration_since(p.added_at) <= self.config.consensus_timeout)
            .map(|(id, p)| (*id, p.transaction.priority(), p.arrival_order))
            .collect();

        candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

        let mut result = Vec::new();
        let mut size = 0usize;
        for (id, ..) in candidates {
            let Some(pending) = txs.get_mut(&id) else {
                continue;
            };
            let encoded_len = serde_json::to_vec(&pending.transaction).map(|b| b.len()).unwrap_or(0);
            if size + encoded_len > max_block_size {
                break;
            }
            size += encoded_len;
            pending.propose_count += 1;
            result.push(pending.transaction.clone());
        }

        result
    }

    /// Discards transactions that have sat in the pool past `consensus_timeout`.
    pub fn reap_expired(&self) -> usize {
        let now = Instant::now();
        let mut txs = self.transactions.write();

        let expired: Vec<_> = txs
            .iter()
            .filter(|(_, p)| now.duration_since(p.added_at) > self.config.consensus_timeout)
            .map(|(id, _)| *id)
            .collect();

        for id in &expired {
            txs.remove(id);
        }

        if !expired.is_empty() {
            tracing::debug!(removed = expired.len(), "reaped expired transactions");
        }

        expired.len()
    }

    /// Returns statistics about the mempool.
    #[must_use]
    pub fn stats(&self) -> MempoolStats {
        let txs = self.transactions.read();
        let now = Instant::now();

        let mut oldest_age = Duration::ZERO;
        let mut total_propose_count = 0u64;

        for pending in txs.values() {
            let age = now.duration_since(pending.added_at);
            if age > oldest_age {
                oldest_age = age;
            }
            total_propose_count += u64::from(pending.propose_count);
        }

        MempoolStats {
            transaction_count: txs.len(),
            oldest_transaction_age: oldest_age,
            average_propose_count: if txs.is_empty() {
                0.0
            } else {
                total_propose_count as f64 / txs.len() as f64
            },
        }
    }
}

/// Statistics about the mempool.
#[derive(Debug, Clone)]
pub struct MempoolStats {
    /// Number of pending transactions.
    pub transaction_count: usize,
    /// Age of the oldest transaction.
    pub oldest_transaction_age: Duration,
    /// Average number of times transactions have been proposed.
    pub average_propose_count: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::AgentSpawn;
    use neuromesh_core::AgentId;
    use neuromesh_identity::{Keypair, SerializablePublicKey, SerializableSignature};

    fn test_tx(seed: u64, priority: u8) -> Transaction {
        let kp = Keypair::from_seed(seed);
        let mut tx = Transaction::AgentSpawn {
            payload: AgentSpawn {
                agent_id: AgentId::generate(),
                architecture: vec![],
                target_node: None,
            },
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
    fn add_and_get_roundtrips() {
        let mempool = Mempool::with_defaults();
        let tx = test_tx(1, 1);
        let id = tx.id();

        assert_eq!(mempool.add(tx).unwrap(), id);
        assert!(mempool.get(&id).is_some());
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let mempool = Mempool::with_defaults();
        let tx = test_tx(1, 1);

        assert!(mempool.add(tx.clone()).is_ok());
        assert!(matches!(mempool.add(tx), Err(ConsensusError::DuplicateTransaction(_))));
    }

    #[test]
    fn proposal_orders_by_priority_descending() {
        let mempool = Mempool::with_defaults();
        mempool.add(test_tx(1, 1)).unwrap();
        mempool.add(test_tx(2, 9)).unwrap();
        mempool.add(test_tx(3, 5)).unwrap();

        let proposal = mempool.get_for_proposal(usize::MAX);
        let priorities: Vec<u8> = proposal.iter().map(Transaction::priority).collect();
        assert_eq!(priorities, vec![9, 5, 1]);
    }

    #[test]
    fn proposal_respects_max_block_size() {
        let mempool = Mempool::with_defaults();
        for i in 1..=5 {
            mempool.add(test_tx(i, i as u8)).unwrap();
        }

        let full = mempool.get_for_proposal(usize::MAX);
        let one_tx_size = serde_json::to_vec(&full[0]).unwrap().len();

        let limited = mempool.get_for_proposal(one_tx_size + 1);
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn remove_batch_drops_finalized_transactions() {
        let mempool = Mempool::with_defaults();
        let mut ids = Vec::new();
        for i in 1..=3 {
            ids.push(mempool.add(test_tx(i, 1)).unwrap());
        }

        mempool.remove_batch(&ids[0..2]);
        assert_eq!(mempool.len(), 1);
    }

    #[test]
    fn capacity_eviction_drops_lowest_priority() {
        let mempool = Mempool::new(MempoolConfig {
            max_transactions: 2,
            ..Default::default()
        });
        let low = test_tx(1, 1);
        let low_id = low.id();
        mempool.add(low).unwrap();
        mempool.add(test_tx(2, 5)).unwrap();
        mempool.add(test_tx(3, 9)).unwrap();

        assert_eq!(mempool.len(), 2);
        assert!(!mempool.contains(&low_id));
    }
}
