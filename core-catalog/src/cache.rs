//! TTL response cache for catalog lookups.
//!
//! Entries are evicted lazily: an expired entry stays in the map until the
//! next `get` touches it or a `clear` sweeps it out. There is no background
//! reaper task.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use bridge_traits::time::Clock;
use tracing::debug;

use crate::models::{SearchPage, Track};

// ===== Keys =====

/// Identity of a cacheable catalog request.
///
/// Keys render to stable strings so callers can purge related entries with a
/// substring pattern (e.g. clearing every `search_` entry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheKey {
    Popular { max_results: u32 },
    Search { query: String, max_results: u32, page_token: Option<String> },
    Category { category_id: String, max_results: u32 },
    Detail { video_id: String },
    Related { video_id: String, max_results: u32 },
}

impl CacheKey {
    /// Search queries are normalized so `" Lofi "` and `"lofi"` share an entry.
    pub fn search(query: &str, max_results: u32, page_token: Option<&str>) -> Self {
        CacheKey::Search {
            query: query.trim().to_lowercase(),
            max_results,
            page_token: page_token.map(str::to_owned),
        }
    }

    pub fn render(&self) -> String {
        match self {
            CacheKey::Popular { max_results } => format!("popular_{max_results}"),
            CacheKey::Search { query, max_results, page_token } => {
                let token = page_token.as_deref().unwrap_or("first");
                format!("search_{query}_{max_results}_{token}")
            }
            CacheKey::Category { category_id, max_results } => {
                format!("category_{category_id}_{max_results}")
            }
            CacheKey::Detail { video_id } => format!("video_{video_id}"),
            CacheKey::Related { video_id, max_results } => {
                format!("related_{video_id}_{max_results}")
            }
        }
    }
}

// ===== Payloads =====

/// The three response shapes the cache stores.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    Tracks(Vec<Track>),
    Page(SearchPage),
    Detail(Track),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: CachedPayload,
    expires_at: DateTime<Utc>,
}

/// Snapshot of cache occupancy, mainly for diagnostics surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub size: usize,
    pub keys: Vec<String>,
}

// ===== Cache =====

/// In-memory TTL cache shared by all catalog operations.
///
/// The clock is injected so tests can step time deterministically instead of
/// sleeping through TTLs.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl ResponseCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { entries: Mutex::new(HashMap::new()), clock }
    }

    /// Returns the cached payload for `key`, evicting it first if expired.
    pub fn get(&self, key: &CacheKey) -> Option<CachedPayload> {
        let rendered = key.render();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(&rendered)?;
        // An entry exactly at its TTL is still a hit; only strictly older
        // entries are expired.
        if entry.expires_at < self.clock.now() {
            debug!(key = %rendered, "cache entry expired, evicting");
            entries.remove(&rendered);
            return None;
        }
        Some(entry.payload.clone())
    }

    pub fn put(&self, key: &CacheKey, payload: CachedPayload, ttl_minutes: i64) {
        let rendered = key.render();
        let expires_at = self.clock.now() + Duration::minutes(ttl_minutes);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(rendered, CacheEntry { payload, expires_at });
    }

    /// Removes a single entry. Returns whether it was present.
    pub fn remove(&self, key: &CacheKey) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(&key.render()).is_some()
    }

    /// Removes entries whose rendered key contains `pattern`, or every entry
    /// when no pattern is given. Returns the number of entries removed.
    pub fn clear(&self, pattern: Option<&str>) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let removed = match pattern {
            Some(pattern) => {
                let before = entries.len();
                entries.retain(|key, _| !key.contains(pattern));
                before - entries.len()
            }
            None => {
                let count = entries.len();
                entries.clear();
                count
            }
        };
        debug!(?pattern, removed, "cleared cache entries");
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort_unstable();
        CacheStats { size: entries.len(), keys }
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("size", &self.stats().size)
            .finish()
    }
}
