//! In-process TTL cache for content types.
//!
//! Dual-keyed: by numeric id and by `(tenant_id, name)`. Entries expire a
//! fixed TTL after insertion, checked lazily on read (no background timer).
//! The cache is process-wide while the data is multi-tenant, so every
//! id-keyed hit re-verifies the entry's tenant before returning it; a
//! mismatch reads as "not found for this tenant".

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::models::ContentType;

/// Entry lifetime (5 minutes).
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Number of content types loaded at startup, ordered by id.
const WARMUP_BATCH: i64 = 20;

#[derive(Clone)]
struct CacheEntry {
    item: ContentType,
    cached_at: Instant,
}

/// Process-wide content type cache with hit/miss accounting.
pub struct ContentTypeCache {
    by_id: DashMap<i64, CacheEntry>,
    by_name: DashMap<(i64, String), CacheEntry>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Cache statistics (monotonic process-lifetime counters).
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total: u64,
    pub hit_rate: f64,
    pub size: usize,
}

enum Lookup {
    Hit(ContentType),
    Expired,
    Miss,
}

impl ContentTypeCache {
    /// Create a cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl(CACHE_TTL)
    }

    /// Create a cache with a custom TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            by_id: DashMap::new(),
            by_name: DashMap::new(),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get a content type by id, tenant-checked.
    pub fn get(&self, id: i64, tenant_id: i64) -> Option<ContentType> {
        // Resolve under the map guard, then act after dropping it.
        let lookup = match self.by_id.get(&id) {
            None => Lookup::Miss,
            Some(entry) if entry.cached_at.elapsed() >= self.ttl => Lookup::Expired,
            Some(entry) if entry.item.tenant_id != tenant_id => Lookup::Miss,
            Some(entry) => Lookup::Hit(entry.item.clone()),
        };

        match lookup {
            Lookup::Hit(item) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(item)
            }
            Lookup::Expired => {
                self.by_id.remove(&id);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Miss => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Get a content type by name within a tenant.
    pub fn get_by_name(&self, name: &str, tenant_id: i64) -> Option<ContentType> {
        let key = (tenant_id, name.to_string());

        let lookup = match self.by_name.get(&key) {
            None => Lookup::Miss,
            Some(entry) if entry.cached_at.elapsed() >= self.ttl => Lookup::Expired,
            Some(entry) => Lookup::Hit(entry.item.clone()),
        };

        match lookup {
            Lookup::Hit(item) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(item)
            }
            Lookup::Expired => {
                self.by_name.remove(&key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Lookup::Miss => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Cache a content type under both keys with a fresh timestamp.
    pub fn put(&self, item: ContentType) {
        let entry = CacheEntry {
            item,
            cached_at: Instant::now(),
        };

        self.by_name.insert(
            (entry.item.tenant_id, entry.item.name.clone()),
            entry.clone(),
        );
        self.by_id.insert(entry.item.id, entry);
    }

    /// Remove a content type from both maps.
    ///
    /// When the name is unknown, the name map is scanned for the id; the
    /// scan is bounded by the cache size, which tops out at recently-used
    /// entries.
    pub fn invalidate(&self, id: i64, name: Option<(i64, &str)>) {
        self.by_id.remove(&id);

        match name {
            Some((tenant_id, name)) => {
                self.by_name.remove(&(tenant_id, name.to_string()));
            }
            None => {
                self.by_name.retain(|_, entry| entry.item.id != id);
            }
        }
    }

    /// Snapshot of hit/miss counters and current size.
    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };

        CacheStats {
            hits,
            misses,
            total,
            hit_rate,
            size: self.by_id.len(),
        }
    }

    /// Opportunistically pre-load the first content types ordered by id.
    ///
    /// Best-effort: failures are logged and never block startup.
    pub async fn warm(&self, pool: &PgPool) {
        match ContentType::list_for_warmup(pool, WARMUP_BATCH).await {
            Ok(types) => {
                let count = types.len();
                for content_type in types {
                    self.put(content_type);
                }
                debug!(count, "content type cache warmed");
            }
            Err(e) => {
                warn!(error = %e, "content type cache warm-up failed");
            }
        }
    }
}

impl Default for ContentTypeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContentTypeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentTypeCache")
            .field("size", &self.by_id.len())
            .finish()
    }
}
