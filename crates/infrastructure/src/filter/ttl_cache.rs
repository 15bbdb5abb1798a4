use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Approximate per-entry bookkeeping cost added to key + value bytes when
/// charging an entry against the byte budget.
const ENTRY_OVERHEAD: usize = 64;

/// Hit/miss/eviction counters, readable without locking.
#[derive(Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub evictions: AtomicU64,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

struct CacheEntry {
    value: Arc<[u8]>,
    expires_at: Instant,
    cost: usize,
}

/// Byte-bounded, time-expiring key→value store.
///
/// One instance fronts each remote service (Safe Browsing, Parental, Safe
/// Search). Values are opaque encoded bytes; readers get an `Arc` clone of
/// the stored buffer, so an entry is either seen whole or not at all.
///
/// Eviction is insertion-order: when an insert pushes the cache over its
/// byte budget, the oldest entries go first. Expired entries answer as
/// misses and are dropped opportunistically on read.
pub struct TtlCache {
    map: DashMap<Box<[u8]>, CacheEntry, FxBuildHasher>,
    /// Keys in insertion order. Replacing a key keeps its original slot.
    order: Mutex<VecDeque<Box<[u8]>>>,
    used_bytes: AtomicUsize,
    max_bytes: usize,
    metrics: CacheMetrics,
}

impl TtlCache {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            map: DashMap::with_hasher(FxBuildHasher),
            order: Mutex::new(VecDeque::new()),
            used_bytes: AtomicUsize::new(0),
            max_bytes,
            metrics: CacheMetrics::default(),
        }
    }

    /// Returns the value for `key`, or `None` on absence or expiry.
    pub fn get(&self, key: &[u8]) -> Option<Arc<[u8]>> {
        if let Some(entry) = self.map.get(key) {
            if entry.expires_at > Instant::now() {
                self.metrics.hits.fetch_add(1, AtomicOrdering::Relaxed);
                return Some(Arc::clone(&entry.value));
            }
            // Expired: drop the ref before removing.
            drop(entry);
            if let Some((_, old)) = self.map.remove(key) {
                self.used_bytes
                    .fetch_sub(old.cost, AtomicOrdering::Relaxed);
                self.metrics.evictions.fetch_add(1, AtomicOrdering::Relaxed);
            }
        }
        self.metrics.misses.fetch_add(1, AtomicOrdering::Relaxed);
        None
    }

    /// Store `value` under `key` for `ttl`. Evicts oldest entries until
    /// the cache fits its byte budget again.
    pub fn set(&self, key: &[u8], value: &[u8], ttl: Duration) {
        let cost = key.len() + value.len() + ENTRY_OVERHEAD;
        let entry = CacheEntry {
            value: Arc::from(value),
            expires_at: Instant::now() + ttl,
            cost,
        };

        match self.map.insert(Box::from(key), entry) {
            Some(old) => {
                // Replaced in place: budget delta only, slot in the
                // insertion queue stays where it was.
                self.used_bytes.fetch_sub(old.cost, AtomicOrdering::Relaxed);
            }
            None => {
                self.order.lock().unwrap().push_back(Box::from(key));
            }
        }
        self.used_bytes.fetch_add(cost, AtomicOrdering::Relaxed);

        self.evict_over_budget();
    }

    fn evict_over_budget(&self) {
        while self.used_bytes.load(AtomicOrdering::Relaxed) > self.max_bytes {
            let oldest = match self.order.lock().unwrap().pop_front() {
                Some(key) => key,
                None => break,
            };
            if let Some((_, old)) = self.map.remove(&oldest) {
                self.used_bytes
                    .fetch_sub(old.cost, AtomicOrdering::Relaxed);
                self.metrics.evictions.fetch_add(1, AtomicOrdering::Relaxed);
                debug!(bytes = old.cost, "Evicted cache entry over byte budget");
            }
        }
    }

    /// Drop every entry and reset the byte accounting. Metrics survive.
    pub fn clear(&self) {
        self.map.clear();
        self.order.lock().unwrap().clear();
        self.used_bytes.store(0, AtomicOrdering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes.load(AtomicOrdering::Relaxed)
    }

    pub fn metrics(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.metrics.hits.load(AtomicOrdering::Relaxed),
            misses: self.metrics.misses.load(AtomicOrdering::Relaxed),
            evictions: self.metrics.evictions.load(AtomicOrdering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(30);

    #[test]
    fn test_set_get_roundtrip() {
        let cache = TtlCache::new(4096);
        cache.set(b"key", b"value", TTL);
        assert_eq!(cache.get(b"key").as_deref(), Some(&b"value"[..]));
    }

    #[test]
    fn test_miss_on_absent_key() {
        let cache = TtlCache::new(4096);
        assert!(cache.get(b"nope").is_none());
        assert_eq!(cache.metrics().misses, 1);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = TtlCache::new(4096);
        cache.set(b"key", b"value", Duration::ZERO);
        assert!(cache.get(b"key").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oldest_evicted_first() {
        // Budget fits roughly three entries.
        let cache = TtlCache::new(3 * (2 + 4 + ENTRY_OVERHEAD));
        cache.set(b"k1", b"aaaa", TTL);
        cache.set(b"k2", b"bbbb", TTL);
        cache.set(b"k3", b"cccc", TTL);
        cache.set(b"k4", b"dddd", TTL);

        assert!(cache.get(b"k1").is_none());
        assert!(cache.get(b"k4").is_some());
        assert!(cache.metrics().evictions >= 1);
    }

    #[test]
    fn test_replace_updates_value_and_budget() {
        let cache = TtlCache::new(4096);
        cache.set(b"key", b"old", TTL);
        let used = cache.used_bytes();
        cache.set(b"key", b"new", TTL);
        assert_eq!(cache.get(b"key").as_deref(), Some(&b"new"[..]));
        assert_eq!(cache.used_bytes(), used);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear_resets_accounting() {
        let cache = TtlCache::new(4096);
        cache.set(b"k1", b"v1", TTL);
        cache.set(b"k2", b"v2", TTL);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.used_bytes(), 0);
        assert!(cache.get(b"k1").is_none());
    }

    #[test]
    fn test_empty_value_roundtrip() {
        // Known-clean reputation entries are stored as empty blobs.
        let cache = TtlCache::new(4096);
        cache.set(b"key", b"", TTL);
        let value = cache.get(b"key").unwrap();
        assert!(value.is_empty());
    }
}
