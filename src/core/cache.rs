use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::error::FetchError;
use crate::core::fingerprint::Query;
use crate::core::models::summary::RawLineItem;

const CACHE_VERSION: u64 = 1;

/// Informational estimate of what one avoided billing-API call costs.
/// A display heuristic carried in the stats, not a financial measurement.
pub const API_CALL_COST: f64 = 0.01;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: Vec<RawLineItem>,
    pub fetched_at: i64,
    pub ttl_seconds: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: i64) -> bool {
        now - self.fetched_at > self.ttl_seconds as i64
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub estimated_savings: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub estimated_savings: f64,
}

/// Result of a cache-mediated retrieval.
#[derive(Debug)]
pub struct CacheLookup {
    pub items: Vec<RawLineItem>,
    pub hit: bool,
}

/// Persistent fingerprint -> raw payload store with TTL-based lazy expiry.
///
/// Guarantees at most one underlying fetch per fingerprint within a TTL
/// window, absent `clear` or expiry. A failed fetch writes nothing, so a
/// later call retries.
#[derive(Debug, Serialize, Deserialize)]
pub struct CostCache {
    #[serde(default)]
    version: u64,
    entries: HashMap<String, CacheEntry>,
    #[serde(default)]
    metrics: CacheMetrics,
    #[serde(skip)]
    path: PathBuf,
}

fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("~"))
                .join(".cache")
        });
    base.join("costlens").join("api-cache.json")
}

impl CostCache {
    fn empty(path: PathBuf) -> Self {
        Self {
            version: CACHE_VERSION,
            entries: HashMap::new(),
            metrics: CacheMetrics::default(),
            path,
        }
    }

    /// Load the cache from `path`, or start empty. A missing, corrupt or
    /// version-mismatched file is discarded, never an error.
    pub fn open(path: PathBuf) -> Self {
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Self>(&content) {
                Ok(mut cache) if cache.version == CACHE_VERSION => {
                    cache.path = path;
                    cache
                }
                _ => Self::empty(path),
            },
            Err(_) => Self::empty(path),
        }
    }

    pub fn open_default() -> Self {
        Self::open(default_path())
    }

    /// Return the cached payload for this query, or run `fetch` exactly
    /// once and store its result. `force_refresh` skips the lookup but
    /// still writes through.
    pub async fn get_or_fetch<F, Fut>(
        &mut self,
        query: &Query,
        ttl_seconds: u64,
        force_refresh: bool,
        fetch: F,
    ) -> Result<CacheLookup, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<RawLineItem>, FetchError>>,
    {
        self.get_or_fetch_at(query, ttl_seconds, force_refresh, Utc::now().timestamp(), fetch)
            .await
    }

    async fn get_or_fetch_at<F, Fut>(
        &mut self,
        query: &Query,
        ttl_seconds: u64,
        force_refresh: bool,
        now: i64,
        fetch: F,
    ) -> Result<CacheLookup, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<RawLineItem>, FetchError>>,
    {
        let key = query.fingerprint().to_string();

        if !force_refresh {
            if let Some(entry) = self.entries.get(&key) {
                if !entry.is_expired(now) {
                    self.metrics.hits += 1;
                    self.metrics.estimated_savings += API_CALL_COST;
                    return Ok(CacheLookup {
                        items: entry.payload.clone(),
                        hit: true,
                    });
                }
                // Lazy eviction: expired entries die at lookup time.
                self.entries.remove(&key);
            }
        }

        // No negative caching: a failed fetch leaves the cache untouched.
        let items = fetch().await?;
        self.metrics.misses += 1;
        self.entries.insert(
            key,
            CacheEntry {
                payload: items.clone(),
                fetched_at: now,
                ttl_seconds,
            },
        );
        Ok(CacheLookup { items, hit: false })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let total = self.metrics.hits + self.metrics.misses;
        let hit_rate = if total > 0 {
            self.metrics.hits as f64 / total as f64
        } else {
            0.0
        };
        CacheStats {
            entries: self.entries.len(),
            hits: self.metrics.hits,
            misses: self.metrics.misses,
            hit_rate,
            estimated_savings: self.metrics.estimated_savings,
        }
    }

    /// Persist the cache atomically: write a temp file, then rename, so a
    /// concurrent reader never observes a partially written entry.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }
        let json = serde_json::to_string(self).context("Failed to serialize cache")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .with_context(|| format!("Failed to write cache to {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move cache into place at {}", self.path.display()))?;
        Ok(())
    }
}
