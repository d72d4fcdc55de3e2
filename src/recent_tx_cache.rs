//! # Recent Transaction Cache
//!
//! Bounded, insertion-ordered set of recently processed transaction hashes,
//! used to suppress `hashtx` notifications the publisher redelivers.
//!
//! Membership is O(1) via a hash set; a queue preserves insertion order so
//! eviction is strict FIFO. The cache is in-memory only and owned by a
//! single consumer; restarts reset it (store writes stay idempotent, so
//! losing dedup state across restarts is harmless).

use std::collections::{HashSet, VecDeque};

pub const DEFAULT_CAPACITY: usize = 20_000;

pub struct RecentTxCache {
    order: VecDeque<String>,
    seen: HashSet<String>,
    capacity: usize,
}

impl RecentTxCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.seen.contains(hash)
    }

    /// Append a hash to the tail, then evict from the head until the
    /// population is back within the capacity bound.
    pub fn record(&mut self, hash: &str) {
        if self.seen.insert(hash.to_string()) {
            self.order.push_back(hash.to_string());
        }
        while self.order.len() > self.capacity {
            self.evict_oldest();
        }
    }

    /// Remove one occurrence of a hash if present. A duplicate notification
    /// removes the entry rather than refreshing it, so a later occurrence
    /// is treated as first-seen again (one-shot suppression).
    pub fn forget(&mut self, hash: &str) -> bool {
        if !self.seen.remove(hash) {
            return false;
        }
        if let Some(pos) = self.order.iter().position(|h| h == hash) {
            self.order.remove(pos);
        }
        true
    }

    /// Evict the oldest entry. Used by `record` and by the dispatcher's
    /// duplicate branch when the population still exceeds the bound.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let oldest = self.order.pop_front()?;
        self.seen.remove(&oldest);
        Some(oldest)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Default for RecentTxCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_after_record() {
        let mut cache = RecentTxCache::with_capacity(4);
        assert!(!cache.contains("beef"));
        cache.record("beef");
        assert!(cache.contains("beef"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn eviction_is_strict_fifo() {
        let mut cache = RecentTxCache::with_capacity(3);
        for hash in ["a", "b", "c", "d"] {
            cache.record(hash);
        }
        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("a"), "oldest entry must be evicted first");
        assert!(cache.contains("b"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn population_never_exceeds_capacity() {
        let mut cache = RecentTxCache::with_capacity(20_000);
        for i in 0..20_001u32 {
            cache.record(&format!("{:08x}", i));
        }
        assert_eq!(cache.len(), 20_000);
        assert!(!cache.contains(&format!("{:08x}", 0u32)));
        assert!(cache.contains(&format!("{:08x}", 20_000u32)));
    }

    #[test]
    fn forget_removes_single_occurrence() {
        let mut cache = RecentTxCache::with_capacity(4);
        cache.record("a");
        cache.record("b");
        assert!(cache.forget("a"));
        assert!(!cache.contains("a"));
        assert_eq!(cache.len(), 1);
        assert!(!cache.forget("a"), "second forget is a no-op");
    }

    #[test]
    fn forgotten_hash_is_first_seen_again() {
        // One-shot suppression: after a duplicate removes the entry, the
        // next occurrence is recorded like a brand new hash.
        let mut cache = RecentTxCache::with_capacity(4);
        cache.record("beef");
        cache.forget("beef");
        assert!(!cache.contains("beef"));
        cache.record("beef");
        assert!(cache.contains("beef"));
    }

    #[test]
    fn recording_an_existing_hash_keeps_population_consistent() {
        let mut cache = RecentTxCache::with_capacity(4);
        cache.record("a");
        cache.record("a");
        assert_eq!(cache.len(), 1);
    }
}
