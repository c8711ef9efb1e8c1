//! In-memory LRU cache of fetched assets.

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use tokio::sync::Mutex;
use tracing::trace;

use super::fetcher::AssetInfo;
use crate::domain::entities::AssetKey;

/// Default maximum number of cached assets.
pub const DEFAULT_CACHE_SIZE: usize = 64;

/// LRU cache of decoded asset metadata, keyed by delivery URL digest.
/// Only successful fetches are stored.
pub struct MemoryAssetCache {
    cache: Mutex<LruCache<AssetKey, Arc<AssetInfo>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for MemoryAssetCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryAssetCache")
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

impl MemoryAssetCache {
    /// Creates a cache holding at most `capacity` assets (minimum one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: Mutex::new(LruCache::new(cap)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the cached asset for `url`, counting hit or miss.
    pub async fn get(&self, url: &str) -> Option<Arc<AssetInfo>> {
        let key = AssetKey::from_url(url);
        let mut cache = self.cache.lock().await;
        if let Some(info) = cache.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            trace!(%key, "Asset cache hit");
            Some(info.clone())
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            trace!(%key, "Asset cache miss");
            None
        }
    }

    /// Stores an asset under its URL.
    pub async fn put(&self, info: Arc<AssetInfo>) {
        let key = AssetKey::from_url(&info.url);
        self.cache.lock().await.put(key, info);
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.cache.lock().await.clear();
    }

    /// Returns cache statistics. The size is a best-effort reading.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_rate: if total > 0 {
                hits as f64 / total as f64 * 100.0
            } else {
                0.0
            },
            size: self.cache.try_lock().map(|c| c.len()).unwrap_or(0),
        }
    }
}

impl Default for MemoryAssetCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

/// Statistics about cache performance.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that missed.
    pub misses: u64,
    /// Percentage.
    pub hit_rate: f64,
    /// Entries currently held.
    pub size: usize,
}

impl std::fmt::Display for CacheStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} assets cached, {:.1}% hit rate ({} hits, {} misses)",
            self.size, self.hit_rate, self.hits, self.misses
        )
    }
}
