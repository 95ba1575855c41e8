//! TTL cache of resolved icon URLs.
//!
//! Negative results (`url == None`) are stored like any other value and
//! expire on the same schedule.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;

/// Default time-to-live for cache entries.
pub const DEFAULT_TTL: Duration = Duration::from_secs(60 * 60);

/// Map size at which `insert` sweeps out expired entries first.
const PRUNE_THRESHOLD: usize = 512;

/// One resolved lookup, stored under its cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconCacheEntry {
    pub url: Option<String>,
    pub resolved_at: Instant,
}

impl IconCacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.resolved_at.elapsed() >= ttl
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub expired: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Concurrent icon cache with insert-or-overwrite semantics.
#[derive(Debug)]
pub struct IconCache {
    entries: DashMap<String, IconCacheEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl IconCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entry for `key`, if any. Expired entries are evicted on read.
    ///
    /// The outer `Option` is presence, the inner one is the cached URL.
    pub fn get(&self, key: &str) -> Option<Option<String>> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.url.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries
                .remove_if(key, |_, entry| entry.is_expired(self.ttl));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    pub fn insert(&self, key: String, url: Option<String>) {
        if self.entries.len() >= PRUNE_THRESHOLD {
            self.prune_expired();
        }
        let entry = IconCacheEntry {
            url,
            resolved_at: Instant::now(),
        };
        self.entries.insert(key, entry);
    }

    /// Remove every expired entry; returns how many were dropped.
    pub fn prune_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(self.ttl));
        before.saturating_sub(self.entries.len())
    }

    /// Drop every entry and reset counters.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let expired = self
            .entries
            .iter()
            .filter(|e| e.value().is_expired(self.ttl))
            .count();

        CacheStats {
            entries: self.entries.len(),
            expired,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for IconCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = IconCache::new(Duration::from_secs(10));
        cache.insert("ETH".to_string(), Some("https://x/eth.png".to_string()));

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(cache.get("ETH"), Some(Some("https://x/eth.png".to_string())));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_absent_and_evicted() {
        let cache = IconCache::new(Duration::from_secs(10));
        cache.insert("ETH".to_string(), Some("https://x/eth.png".to_string()));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(cache.stats().expired, 1);
        assert_eq!(cache.get("ETH"), None);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prune_drops_only_expired() {
        let cache = IconCache::new(Duration::from_secs(10));
        cache.insert("OLD".to_string(), None);
        tokio::time::advance(Duration::from_secs(6)).await;
        cache.insert("NEW".to_string(), None);
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.prune_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("NEW"), Some(None));
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_sweeps_unread_expired_keys() {
        let cache = IconCache::new(Duration::from_secs(10));
        for i in 0..PRUNE_THRESHOLD {
            cache.insert(format!("T{i}"), None);
        }
        tokio::time::advance(Duration::from_secs(10)).await;

        cache.insert("FRESH".to_string(), Some("https://x/fresh.png".to_string()));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expired, 0);
    }

    #[tokio::test]
    async fn test_negative_entry() {
        let cache = IconCache::default();
        cache.insert("NOPE".to_string(), None);
        assert_eq!(cache.get("NOPE"), Some(None));
    }

    #[tokio::test]
    async fn test_clear_and_stats() {
        let cache = IconCache::default();
        cache.insert("A".to_string(), None);
        cache.insert("B".to_string(), Some("https://x/b.png".to_string()));
        assert!(cache.get("A").is_some());
        assert!(cache.get("C").is_none());

        let stats = cache.stats();
        assert_eq!(stats.entries, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
