//! In-memory TTL cache consulted before and populated after every
//! resolution attempt.
//!
//! ## Eviction Strategy
//! - LRU eviction when the entry limit is exceeded
//! - TTL-based expiration on read (lazy); expired entries are treated as
//!   absent, never returned

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lru::LruCache;
use tokio::sync::RwLock;

use forest_common::Category;

/// Fixed TTL class per category. TTLs mirror each upstream's natural update
/// cadence: shorter than the refresh interval wastes quota, longer risks
/// staleness during active-incident monitoring.
pub fn category_ttl(category: Category) -> Duration {
    match category {
        Category::Fire => Duration::from_secs(15 * 60),
        Category::Deforestation => Duration::from_secs(60 * 60),
        Category::Weather => Duration::from_secs(10 * 60),
        Category::Biodiversity => Duration::from_secs(24 * 60 * 60),
        Category::Satellite => Duration::from_secs(30 * 60),
    }
}

/// TTL class for region summaries (same 24 h class as species data).
pub const REGION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct CacheEntry<T> {
    value: T,
    inserted_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() >= self.ttl
    }
}

/// Counters for one cache instance.
#[derive(Default)]
pub struct CacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub expired: AtomicU64,
}

/// Key→value store with per-entry TTL and LRU bounds.
///
/// `get` takes the write lock so the expire-check and eviction happen under
/// one guard; the check-then-act pair is atomic under a multi-threaded
/// runtime.
pub struct TtlCache<T> {
    entries: RwLock<LruCache<String, CacheEntry<T>>>,
    stats: Arc<CacheStats>,
}

impl<T: Clone> TtlCache<T> {
    pub fn new(max_entries: usize) -> Self {
        let capacity = NonZeroUsize::new(max_entries.max(1)).unwrap();
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            stats: Arc::new(CacheStats::default()),
        }
    }

    /// Returns the cached value, or None on miss or expiry. Never errors.
    pub async fn get(&self, key: &str) -> Option<T> {
        let mut entries = self.entries.write().await;

        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.pop(key);
                self.stats.expired.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Overwrite, not merge: a second insert for the same key replaces the
    /// previous value and restarts its TTL.
    pub async fn insert(&self, key: impl Into<String>, value: T, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.put(
            key.into(),
            CacheEntry {
                value,
                inserted_at: Instant::now(),
                ttl,
            },
        );
    }

    /// Drop every entry. Used when the user clears the cache or toggles
    /// global configuration.
    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        if count > 0 {
            tracing::debug!(count, "cache cleared");
        }
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}
