//! Deduplication cache for structurally equal nodes.
//!
//! Buckets are keyed by structural hash. A hash match is only a filter: the
//! caller confirms each candidate by comparing opcode, metadata, shapes and the
//! operand hash chain before reusing it. Missing a duplicate only costs memory.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::hash::HashValue;
use crate::node::NodeId;

/// Lookup counters of a [`Graph`](crate::Graph)'s dedup cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Default)]
pub(crate) struct DedupCache {
    buckets: HashMap<HashValue, SmallVec<[NodeId; 1]>>,
    hits: u64,
    misses: u64,
}

impl DedupCache {
    /// Return the first candidate with `hash` accepted by `is_equal`.
    pub(crate) fn find<F>(&mut self, hash: HashValue, mut is_equal: F) -> Option<NodeId>
    where
        F: FnMut(NodeId) -> bool,
    {
        let found = self.buckets.get(&hash).and_then(|bucket| bucket.iter().copied().find(|&id| is_equal(id)));
        match found {
            Some(_) => self.hits += 1,
            None => self.misses += 1,
        }
        found
    }

    pub(crate) fn insert(&mut self, hash: HashValue, id: NodeId) {
        self.buckets.entry(hash).or_default().push(id);
    }

    pub(crate) fn remove(&mut self, hash: HashValue, id: NodeId) {
        if let Some(bucket) = self.buckets.get_mut(&hash) {
            bucket.retain(|candidate| *candidate != id);
            if bucket.is_empty() {
                self.buckets.remove(&hash);
            }
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        CacheStats { hits: self.hits, misses: self.misses, entries: self.buckets.values().map(SmallVec::len).sum() }
    }
}
