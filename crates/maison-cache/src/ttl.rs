//! Interior-mutable TTL cache with stale-while-revalidate lookups.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

use crate::policy::{CachePolicy, CacheState};

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Entry within its TTL.
    Fresh(T),
    /// Entry past its TTL but within the stale window; the caller should
    /// serve it and trigger a background refresh.
    Stale(T),
    /// No usable entry.
    Miss,
}

impl<T> Lookup<T> {
    /// The cached value, fresh or stale.
    pub fn value(self) -> Option<T> {
        match self {
            Lookup::Fresh(v) | Lookup::Stale(v) => Some(v),
            Lookup::Miss => None,
        }
    }
}

struct Entry<T> {
    value: T,
    stored_at: Instant,
}

/// A keyed in-memory cache with TTL and optional stale-while-revalidate.
///
/// Safe to share behind an `Arc`; all methods take `&self`. Expired entries
/// are evicted lazily on lookup and insert.
pub struct TtlCache<T> {
    policy: CachePolicy,
    entries: Mutex<HashMap<String, Entry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Look up a key, classifying the entry by age.
    pub fn get(&self, key: &str) -> Lookup<T> {
        let Ok(mut entries) = self.entries.lock() else {
            return Lookup::Miss;
        };
        let Some(entry) = entries.get(key) else {
            return Lookup::Miss;
        };

        match self.policy.state_at(entry.stored_at.elapsed()) {
            CacheState::Fresh => Lookup::Fresh(entry.value.clone()),
            CacheState::Stale => Lookup::Stale(entry.value.clone()),
            CacheState::Expired => {
                entries.remove(key);
                Lookup::Miss
            }
        }
    }

    /// Insert or replace an entry, resetting its age.
    pub fn insert(&self, key: impl Into<String>, value: T) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                key.into(),
                Entry {
                    value,
                    stored_at: Instant::now(),
                },
            );
        }
    }

    /// Drop a single entry.
    pub fn invalidate(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Number of entries currently held (including stale ones).
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_miss_then_fresh() {
        let cache: TtlCache<i32> = TtlCache::new(CachePolicy::ttl(Duration::from_secs(60)));
        assert_eq!(cache.get("k"), Lookup::Miss);

        cache.insert("k", 42);
        assert_eq!(cache.get("k"), Lookup::Fresh(42));
    }

    #[test]
    fn test_zero_ttl_with_swr_serves_stale() {
        let policy = CachePolicy::ttl(Duration::ZERO).with_swr(Duration::from_secs(60));
        let cache: TtlCache<i32> = TtlCache::new(policy);

        cache.insert("k", 7);
        // Immediately past the zero TTL but inside the stale window.
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), Lookup::Stale(7));
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let policy = CachePolicy::ttl(Duration::ZERO);
        let cache: TtlCache<i32> = TtlCache::new(policy);

        cache.insert("k", 7);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), Lookup::Miss);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate() {
        let cache: TtlCache<i32> = TtlCache::new(CachePolicy::default());
        cache.insert("k", 1);
        cache.invalidate("k");
        assert_eq!(cache.get("k"), Lookup::Miss);
    }

    #[test]
    fn test_insert_resets_age() {
        let policy = CachePolicy::ttl(Duration::from_millis(50));
        let cache: TtlCache<i32> = TtlCache::new(policy);

        cache.insert("k", 1);
        std::thread::sleep(Duration::from_millis(30));
        cache.insert("k", 2);
        std::thread::sleep(Duration::from_millis(30));
        // 60ms after the first insert but only 30ms after the second.
        assert_eq!(cache.get("k"), Lookup::Fresh(2));
    }
}
