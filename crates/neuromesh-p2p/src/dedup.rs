//! Age-based deduplication cache for broadcast forwarding.

use neuromesh_core::{MessageId, NodeId, Timestamp};
use std::collections::HashMap;
use std::time::Duration;

/// Tracks `(source, id)` pairs already rebroadcast, evicting entries older
/// than `max_age` so the cache does not grow unbounded.
pub(crate) struct DedupCache {
    seen: HashMap<(NodeId, MessageId), Timestamp>,
    max_age: Duration,
}

impl DedupCache {
    pub(crate) fn new(max_age: Duration) -> Self {
        Self {
            seen: HashMap::new(),
            max_age,
        }
    }

    /// Returns true if this is the first time `(source, id)` has been seen,
    /// recording it and evicting stale entries as a side effect.
    pub(crate) fn insert_if_new(&mut self, source: NodeId, id: MessageId) -> bool {
        let now = Timestamp::now();
        self.seen
            .retain(|_, seen_at| seen_at.elapsed_until(now) <= self.max_age);
        self.seen.insert((source, id), now).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_is_new_second_is_not() {
        let mut cache = DedupCache::new(Duration::from_secs(60));
        let source = NodeId::generate();
        let id = MessageId::generate();
        assert!(cache.insert_if_new(source, id));
        assert!(!cache.insert_if_new(source, id));
    }

    #[test]
    fn distinct_ids_are_both_new() {
        let mut cache = DedupCache::new(Duration::from_secs(60));
        let source = NodeId::generate();
        assert!(cache.insert_if_new(source, MessageId::generate()));
        assert!(cache.insert_if_new(source, MessageId::generate()));
    }
}
