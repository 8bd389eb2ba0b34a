//! In-memory TTL cache.

use crate::domain::ohlcv::OhlcvBar;
use crate::ports::cache_port::{CachePort, CacheStats};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

struct CacheEntry {
    bars: Vec<OhlcvBar>,
    /// `None` when the TTL runs past what `Instant` can represent.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

#[derive(Default)]
pub struct MemoryCache {
    data: DashMap<String, CacheEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CachePort for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<OhlcvBar>> {
        let live = self.data.get(key).and_then(|entry| {
            entry.is_live(Instant::now()).then(|| entry.bars.clone())
        });
        match live {
            Some(bars) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(bars)
            }
            None => {
                self.data.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn set(&self, key: &str, bars: Vec<OhlcvBar>, ttl: Duration) {
        self.data.insert(
            key.to_string(),
            CacheEntry {
                bars,
                expires_at: Instant::now().checked_add(ttl),
            },
        );
    }

    fn clear(&self) {
        self.data.clear();
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.data.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bars() -> Vec<OhlcvBar> {
        vec![OhlcvBar {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            open: 1.0,
            high: 1.0,
            low: 1.0,
            close: 1.0,
            volume: 10.0,
        }]
    }

    #[test]
    fn get_after_set() {
        let cache = MemoryCache::new();
        cache.set("k", bars(), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(bars()));
        assert_eq!(cache.get("other"), None);
        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn expired_entry_is_a_miss_and_evicted() {
        let cache = MemoryCache::new();
        cache.set("k", bars(), Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn zero_ttl_never_serves() {
        let cache = MemoryCache::new();
        cache.set("k", bars(), Duration::ZERO);
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn unrepresentable_ttl_never_expires() {
        let cache = MemoryCache::new();
        cache.set("k", bars(), Duration::MAX);
        assert_eq!(cache.get("k"), Some(bars()));
    }

    #[test]
    fn clear_empties() {
        let cache = MemoryCache::new();
        cache.set("a", bars(), Duration::from_secs(60));
        cache.set("b", bars(), Duration::from_secs(60));
        cache.clear();
        assert_eq!(cache.stats().entries, 0);
    }
}
