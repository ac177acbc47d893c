//! In-memory TTL cache for upstream answers.
//!
//! One process-wide instance is constructed at startup and handed to the
//! resolver behind an `Arc`. Entries live until their TTL elapses; there is no
//! size bound and nothing survives a restart.
//!
//! The map is sharded ([`DashMap`]), so lookups on different keys never
//! contend, and an entry is always replaced as a whole: a reader sees either
//! the previous value or the new one.

mod clock;

pub use clock::{Clock, ManualClock, SystemClock};

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::trace;

/// Default TTL applied by [`TtlCache::set`].
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Key/value cache with a default and a per-entry time-to-live.
pub struct TtlCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache using the wall clock and [`DEFAULT_TTL`].
    pub fn new() -> Self {
        Self::with_clock(DEFAULT_TTL, Arc::new(SystemClock))
    }

    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            clock,
        }
    }

    /// Look up a live entry.
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        // Guard must drop before `remove_if` touches the same shard.
        let hit = {
            let entry = self.entries.get(key)?;
            (entry.expires_at > now).then(|| entry.value.clone())
        };
        if hit.is_none() {
            self.entries.remove_if(key, |_, e| e.expires_at <= now);
            trace!(key, "cache entry expired");
        }
        hit
    }

    /// Insert or overwrite an entry using the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Insert or overwrite an entry with an explicit TTL.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .insert(key.into(), CacheEntry { value, expires_at });
    }

    /// Number of stored entries, expired ones included until they are purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before.saturating_sub(self.entries.len())
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manual_cache(ttl: Duration) -> (TtlCache<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TtlCache::with_clock(ttl, clock.clone()), clock)
    }

    #[test]
    fn test_cache_set_get() {
        let (cache, _) = manual_cache(Duration::from_secs(60));
        cache.set("quote_AAPL", "153.25".to_string());
        assert_eq!(cache.get("quote_AAPL"), Some("153.25".to_string()));
    }

    #[test]
    fn test_cache_miss() {
        let (cache, _) = manual_cache(Duration::from_secs(60));
        assert!(cache.get("quote_NONE").is_none());
    }

    #[test]
    fn test_default_ttl_expiry() {
        let (cache, clock) = manual_cache(Duration::from_secs(60));
        cache.set("quote_AAPL", "a".to_string());

        clock.advance(Duration::from_secs(59));
        assert!(cache.get("quote_AAPL").is_some());

        clock.advance(Duration::from_secs(1));
        assert!(cache.get("quote_AAPL").is_none());
        // Expired entry was removed on access
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_per_entry_ttl() {
        let (cache, clock) = manual_cache(Duration::from_secs(60));
        cache.set("short", "s".to_string());
        cache.set_with_ttl("long", "l".to_string(), Duration::from_secs(300));

        clock.advance(Duration::from_secs(120));
        assert!(cache.get("short").is_none());
        assert_eq!(cache.get("long"), Some("l".to_string()));

        clock.advance(Duration::from_secs(180));
        assert!(cache.get("long").is_none());
    }

    #[test]
    fn test_overwrite_resets_expiry() {
        let (cache, clock) = manual_cache(Duration::from_secs(60));
        cache.set("k", "old".to_string());
        clock.advance(Duration::from_secs(50));
        cache.set("k", "new".to_string());
        clock.advance(Duration::from_secs(50));
        assert_eq!(cache.get("k"), Some("new".to_string()));
    }

    #[test]
    fn test_purge_expired() {
        let (cache, clock) = manual_cache(Duration::from_secs(10));
        cache.set("a", "1".to_string());
        cache.set_with_ttl("b", "2".to_string(), Duration::from_secs(100));
        clock.advance(Duration::from_secs(20));
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_writers_last_set_wins() {
        let cache = Arc::new(TtlCache::<usize>::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for n in 0..500 {
                        cache.set("shared", i * 1000 + n);
                        let _ = cache.get("shared");
                        cache.set(format!("own_{}", i), n);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let value = cache.get("shared").unwrap();
        assert_eq!(value % 1000, 499);
        for i in 0..8 {
            assert_eq!(cache.get(&format!("own_{}", i)), Some(499));
        }
    }
}
