//! Generic LRU cache with lazy TTL expiry.

use std::collections::VecDeque;
use std::hash::Hash;
use std::time::{Duration, SystemTime};

use rustc_hash::FxHashMap;

/// A cached value with the time it was stored (or the caller-supplied stamp).
#[derive(Debug, Clone)]
struct CacheEntry<T> {
    data: T,
    modified: SystemTime,
}

/// Keyed store with least-recently-used eviction and time-to-live staleness.
///
/// Bookkeeping invariants:
/// - every key in the map appears exactly once in the access list,
///   most-recently-used at the tail
/// - `len() <= max_size` is enforced before each insertion (the single LRU
///   entry is evicted first when at capacity)
/// - expiry is checked lazily on `get`, never by a background sweep
pub struct LruCache<K, T> {
    entries: FxHashMap<K, CacheEntry<T>>,
    /// Access order, least-recently-used at the front.
    access: VecDeque<K>,
    max_size: usize,
    /// Zero disables expiry.
    ttl: Duration,
}

impl<K, T> LruCache<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    /// Create a cache holding at most `max_size` entries. `ttl` of zero
    /// disables time-based expiry.
    pub fn new(max_size: usize, ttl: Duration) -> Self {
        Self {
            entries: FxHashMap::default(),
            access: VecDeque::with_capacity(max_size),
            max_size: max_size.max(1),
            ttl,
        }
    }

    /// Look up a key, refreshing its recency. Expired entries are removed
    /// and reported as misses.
    pub fn get(&mut self, key: &K) -> Option<T> {
        let expired = match self.entries.get(key) {
            None => return None,
            Some(entry) => self.is_expired(entry),
        };

        if expired {
            self.remove(key);
            return None;
        }

        self.touch(key);
        self.entries.get(key).map(|e| e.data.clone())
    }

    /// Insert a value, evicting the least-recently-used entry first when at
    /// capacity. `modified` defaults to now; callers that track the source's
    /// own timestamp can pass it explicitly.
    pub fn set(&mut self, key: K, data: T, modified: Option<SystemTime>) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.max_size {
            if let Some(lru) = self.access.pop_front() {
                self.entries.remove(&lru);
            }
        }

        self.entries.insert(
            key.clone(),
            CacheEntry {
                data,
                modified: modified.unwrap_or_else(SystemTime::now),
            },
        );
        self.touch(&key);
    }

    /// Remove a key. Returns true when an entry existed.
    pub fn remove(&mut self, key: &K) -> bool {
        self.access.retain(|k| k != key);
        self.entries.remove(key).is_some()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.access.clear();
    }

    /// Whether a key is present (does not refresh recency or check expiry).
    pub fn has(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in access order, least-recently-used first.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.access.iter()
    }

    /// Stored modification time for a key, if present.
    pub fn modified(&self, key: &K) -> Option<SystemTime> {
        self.entries.get(key).map(|e| e.modified)
    }

    fn is_expired(&self, entry: &CacheEntry<T>) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        SystemTime::now()
            .duration_since(entry.modified)
            .map(|age| age > self.ttl)
            .unwrap_or(false)
    }

    /// Move a key to the most-recently-used position.
    fn touch(&mut self, key: &K) {
        self.access.retain(|k| k != key);
        self.access.push_back(key.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(max: usize) -> LruCache<String, i32> {
        LruCache::new(max, Duration::ZERO)
    }

    #[test]
    fn test_set_get() {
        let mut c = cache(4);
        c.set("a".into(), 1, None);
        assert_eq!(c.get(&"a".into()), Some(1));
        assert_eq!(c.get(&"b".into()), None);
        assert!(c.has(&"a".into()));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn test_eviction_removes_exactly_lru() {
        let mut c = cache(3);
        c.set("a".into(), 1, None);
        c.set("b".into(), 2, None);
        c.set("c".into(), 3, None);
        c.set("d".into(), 4, None);

        assert_eq!(c.len(), 3);
        assert!(!c.has(&"a".into()));
        assert!(c.has(&"b".into()));
        assert!(c.has(&"c".into()));
        assert!(c.has(&"d".into()));
    }

    #[test]
    fn test_get_refreshes_recency() {
        let mut c = cache(3);
        c.set("a".into(), 1, None);
        c.set("b".into(), 2, None);
        c.set("c".into(), 3, None);

        // Touch "a" so "b" becomes the eviction candidate
        assert_eq!(c.get(&"a".into()), Some(1));
        c.set("d".into(), 4, None);

        assert!(c.has(&"a".into()));
        assert!(!c.has(&"b".into()));
    }

    #[test]
    fn test_overwrite_does_not_evict() {
        let mut c = cache(2);
        c.set("a".into(), 1, None);
        c.set("b".into(), 2, None);
        c.set("a".into(), 10, None);

        assert_eq!(c.len(), 2);
        assert_eq!(c.get(&"a".into()), Some(10));
        assert_eq!(c.get(&"b".into()), Some(2));
    }

    #[test]
    fn test_ttl_expiry() {
        let mut c: LruCache<String, i32> = LruCache::new(4, Duration::from_millis(20));
        c.set("a".into(), 1, None);
        assert_eq!(c.get(&"a".into()), Some(1));

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(c.get(&"a".into()), None);
        // No resurrection: the expired entry is gone
        assert!(!c.has(&"a".into()));
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let mut c = cache(4);
        // Entry stamped far in the past must still be retrievable
        let old = SystemTime::now() - Duration::from_secs(3600);
        c.set("a".into(), 1, Some(old));
        assert_eq!(c.get(&"a".into()), Some(1));
    }

    #[test]
    fn test_keys_in_access_order() {
        let mut c = cache(4);
        c.set("a".into(), 1, None);
        c.set("b".into(), 2, None);
        c.get(&"a".into());

        let keys: Vec<_> = c.keys().cloned().collect();
        assert_eq!(keys, vec!["b".to_string(), "a".to_string()]);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut c = cache(4);
        c.set("a".into(), 1, None);
        c.set("b".into(), 2, None);

        assert!(c.remove(&"a".into()));
        assert!(!c.remove(&"a".into()));
        assert_eq!(c.len(), 1);

        c.clear();
        assert!(c.is_empty());
        assert_eq!(c.keys().count(), 0);
    }
}
