//! Client for the remote video catalog API.
//!
//! Every list operation goes through the [`ResponseCache`] first; only cache
//! misses hit the network. All searches are constrained to the music video
//! category of the backend.

use std::sync::Arc;
use std::time::Duration;

use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::Clock;
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use core_runtime::{CacheTtlConfig, CatalogConfig};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::cache::{CacheKey, CacheStats, CachedPayload, ResponseCache};
use crate::error::{CatalogError, Result};
use crate::models::{self, SearchPage, Track};

/// Backend category id for music videos.
const MUSIC_VIDEO_CATEGORY: &str = "10";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback backoff when a 429 response carries no usable Retry-After header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

// ===== Wire format =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
    next_page_token: Option<String>,
    page_info: Option<PageInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    total_results: u64,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    content_details: Option<ContentDetails>,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    description: String,
    published_at: Option<String>,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl Snippet {
    /// Preferred display thumbnail: medium, falling back to default.
    fn thumbnail_url(&self) -> String {
        self.thumbnails
            .medium
            .as_ref()
            .or(self.thumbnails.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }

    /// Large artwork: high, falling back to medium.
    fn thumbnail_high_url(&self) -> String {
        self.thumbnails
            .high
            .as_ref()
            .or(self.thumbnails.medium.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }

    fn into_track(self, id: String, duration_secs: Option<u32>) -> Track {
        let thumbnail_url = self.thumbnail_url();
        let thumbnail_high_url = self.thumbnail_high_url();
        let published_at = self
            .published_at
            .as_deref()
            .and_then(|raw| chrono::DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc));
        Track {
            id,
            title: self.title,
            artist: self.channel_title,
            thumbnail_url,
            thumbnail_high_url,
            description: self.description,
            published_at,
            duration_secs,
        }
    }
}

// ===== Client =====

/// Catalog API client with a shared TTL response cache.
///
/// Cloneable; clones share the cache and emit on the same event bus.
#[derive(Clone)]
pub struct CatalogClient {
    http: Arc<dyn HttpClient>,
    cache: Arc<ResponseCache>,
    events: EventBus,
    config: CatalogConfig,
    ttl: CacheTtlConfig,
}

impl CatalogClient {
    pub fn new(
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
        events: EventBus,
        config: CatalogConfig,
        ttl: CacheTtlConfig,
    ) -> Self {
        Self {
            http,
            cache: Arc::new(ResponseCache::new(clock)),
            events,
            config,
            ttl,
        }
    }

    // ===== Operations =====

    /// Searches the catalog for music matching `query`.
    ///
    /// The query is scoped to music results before it is sent; pass
    /// `page_token` from a previous [`SearchPage`] to fetch the next page.
    pub async fn search(
        &self,
        query: &str,
        max_results: Option<u32>,
        page_token: Option<&str>,
    ) -> Result<SearchPage> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CatalogError::InvalidRequest("search query is empty".into()));
        }
        let max_results = self.page_size(max_results)?;

        let key = CacheKey::search(query, max_results, page_token);
        if let Some(CachedPayload::Page(page)) = self.cache.get(&key) {
            debug!(query, "search served from cache");
            self.emit_fetched("search", page.tracks.len(), true);
            return Ok(page);
        }

        let mut url = format!(
            "{}/search?part=snippet&q={}&type=video&videoCategoryId={}&maxResults={}&key={}",
            self.config.base_url,
            urlencoding::encode(&format!("{query} music")),
            MUSIC_VIDEO_CATEGORY,
            max_results,
            urlencoding::encode(&self.config.api_key),
        );
        if let Some(token) = page_token {
            url.push_str("&pageToken=");
            url.push_str(&urlencoding::encode(token));
        }

        let response = self.fetch("search", &url).await?;
        let body: SearchResponse = self.parse("search", &response)?;

        let page = SearchPage {
            tracks: map_search_items(body.items),
            next_page_token: body.next_page_token,
            total_results: body.page_info.map(|p| p.total_results).unwrap_or(0),
        };
        self.cache.put(
            &key,
            CachedPayload::Page(page.clone()),
            i64::from(self.ttl.search_minutes),
        );
        self.emit_fetched("search", page.tracks.len(), false);
        Ok(page)
    }

    /// Fetches the current popular music chart for the configured region.
    pub async fn popular(&self, max_results: Option<u32>) -> Result<Vec<Track>> {
        let max_results = self.page_size(max_results)?;
        let key = CacheKey::Popular { max_results };
        if let Some(CachedPayload::Tracks(tracks)) = self.cache.get(&key) {
            self.emit_fetched("popular", tracks.len(), true);
            return Ok(tracks);
        }

        let url = format!(
            "{}/videos?part=snippet&chart=mostPopular&videoCategoryId={}&regionCode={}&maxResults={}&key={}",
            self.config.base_url,
            MUSIC_VIDEO_CATEGORY,
            urlencoding::encode(&self.config.region),
            max_results,
            urlencoding::encode(&self.config.api_key),
        );

        let response = self.fetch("popular", &url).await?;
        let body: VideosResponse = self.parse("popular", &response)?;

        let tracks: Vec<Track> = body
            .items
            .into_iter()
            .map(|item| item.snippet.into_track(item.id, None))
            .collect();
        self.cache.put(
            &key,
            CachedPayload::Tracks(tracks.clone()),
            i64::from(self.ttl.popular_minutes),
        );
        self.emit_fetched("popular", tracks.len(), false);
        Ok(tracks)
    }

    /// Fetches tracks for a curated browse category.
    ///
    /// Unknown category ids are rejected; see [`models::MUSIC_CATEGORIES`]
    /// for the valid set.
    pub async fn by_category(
        &self,
        category_id: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<Track>> {
        let category = models::category_by_id(category_id).ok_or_else(|| {
            CatalogError::InvalidRequest(format!("unknown category: {category_id}"))
        })?;
        let max_results = self.page_size(max_results)?;

        let key = CacheKey::Category {
            category_id: category.id.to_string(),
            max_results,
        };
        if let Some(CachedPayload::Tracks(tracks)) = self.cache.get(&key) {
            self.emit_fetched("category", tracks.len(), true);
            return Ok(tracks);
        }

        let page = self
            .search(&format!("{} playlist", category.query), Some(max_results), None)
            .await?;
        self.cache.put(
            &key,
            CachedPayload::Tracks(page.tracks.clone()),
            i64::from(self.ttl.category_minutes),
        );
        self.emit_fetched("category", page.tracks.len(), false);
        Ok(page.tracks)
    }

    /// Fetches full details for a single track, including its duration.
    ///
    /// Returns `Ok(None)` when the id resolves to nothing; transport and
    /// backend failures are errors, not `None`.
    pub async fn track_details(&self, video_id: &str) -> Result<Option<Track>> {
        if video_id.is_empty() {
            return Err(CatalogError::InvalidRequest("video id is empty".into()));
        }
        let key = CacheKey::Detail { video_id: video_id.to_string() };
        if let Some(CachedPayload::Detail(track)) = self.cache.get(&key) {
            self.emit_fetched("details", 1, true);
            return Ok(Some(track));
        }

        let url = format!(
            "{}/videos?part=snippet,contentDetails&id={}&key={}",
            self.config.base_url,
            urlencoding::encode(video_id),
            urlencoding::encode(&self.config.api_key),
        );

        let response = self.fetch("details", &url).await?;
        let body: VideosResponse = self.parse("details", &response)?;

        let Some(item) = body.items.into_iter().next() else {
            debug!(video_id, "no catalog entry for id");
            return Ok(None);
        };
        let duration_secs = item
            .content_details
            .as_ref()
            .and_then(|d| models::parse_iso8601_duration(&d.duration));
        let track = item.snippet.into_track(item.id, duration_secs);

        self.cache.put(
            &key,
            CachedPayload::Detail(track.clone()),
            i64::from(self.ttl.detail_minutes),
        );
        self.emit_fetched("details", 1, false);
        Ok(Some(track))
    }

    /// Fetches tracks related to `video_id`.
    ///
    /// This powers autoplay suggestions, so it degrades instead of failing:
    /// any fetch or parse error yields an empty list.
    pub async fn related(&self, video_id: &str, max_results: Option<u32>) -> Result<Vec<Track>> {
        if video_id.is_empty() {
            return Err(CatalogError::InvalidRequest("video id is empty".into()));
        }
        let max_results = self.page_size(max_results)?;
        let key = CacheKey::Related {
            video_id: video_id.to_string(),
            max_results,
        };
        if let Some(CachedPayload::Tracks(tracks)) = self.cache.get(&key) {
            self.emit_fetched("related", tracks.len(), true);
            return Ok(tracks);
        }

        let url = format!(
            "{}/search?part=snippet&relatedToVideoId={}&type=video&videoCategoryId={}&maxResults={}&key={}",
            self.config.base_url,
            urlencoding::encode(video_id),
            MUSIC_VIDEO_CATEGORY,
            max_results,
            urlencoding::encode(&self.config.api_key),
        );

        let tracks = match self.fetch("related", &url).await {
            Ok(response) => match self.parse::<SearchResponse>("related", &response) {
                Ok(body) => map_search_items(body.items),
                Err(e) => {
                    warn!(video_id, error = %e, "related lookup unparseable, returning empty");
                    return Ok(Vec::new());
                }
            },
            Err(e) => {
                warn!(video_id, error = %e, "related lookup failed, returning empty");
                return Ok(Vec::new());
            }
        };

        self.cache.put(
            &key,
            CachedPayload::Tracks(tracks.clone()),
            i64::from(self.ttl.related_minutes),
        );
        self.emit_fetched("related", tracks.len(), false);
        Ok(tracks)
    }

    // ===== Cache management =====

    /// Purges cached responses. `pattern` selects by key substring
    /// (e.g. `"search_"`); `None` clears everything.
    pub fn clear_cache(&self, pattern: Option<&str>) -> usize {
        let removed = self.cache.clear(pattern);
        let _ = self.events.emit(CoreEvent::Catalog(CatalogEvent::CacheCleared {
            entries_removed: removed,
        }));
        removed
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // ===== Internals =====

    fn page_size(&self, requested: Option<u32>) -> Result<u32> {
        let n = requested.unwrap_or(self.config.max_results);
        if !(1..=50).contains(&n) {
            return Err(CatalogError::InvalidRequest(format!(
                "max_results must be 1-50, got {n}"
            )));
        }
        Ok(n)
    }

    async fn fetch(&self, kind: &str, url: &str) -> Result<HttpResponse> {
        debug!(kind, "fetching from catalog API");
        let request = HttpRequest::get(url)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        let response = self.http.execute(request).await.map_err(|e| {
            let err = CatalogError::Network(e.to_string());
            self.emit_failed(kind, &err);
            err
        })?;

        if response.status == 429 {
            let retry_after_secs = response
                .headers
                .get("retry-after")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            let err = CatalogError::RateLimited { retry_after_secs };
            self.emit_failed(kind, &err);
            return Err(err);
        }

        if !response.is_success() {
            let body = response.text().unwrap_or_default();
            let err = CatalogError::Http {
                status: response.status,
                body: truncate(&body, 200),
            };
            self.emit_failed(kind, &err);
            return Err(err);
        }

        Ok(response)
    }

    fn parse<T: serde::de::DeserializeOwned>(
        &self,
        kind: &str,
        response: &HttpResponse,
    ) -> Result<T> {
        response.json().map_err(|e| {
            let err = CatalogError::JsonParse(e.to_string());
            self.emit_failed(kind, &err);
            err
        })
    }

    // Emission is best-effort; an idle bus with no subscribers is not an error.
    fn emit_fetched(&self, kind: &str, count: usize, from_cache: bool) {
        let _ = self.events.emit(CoreEvent::Catalog(CatalogEvent::Fetched {
            kind: kind.to_string(),
            count,
            from_cache,
        }));
    }

    fn emit_failed(&self, kind: &str, error: &CatalogError) {
        let _ = self.events.emit(CoreEvent::Catalog(CatalogEvent::FetchFailed {
            kind: kind.to_string(),
            message: error.to_string(),
        }));
    }
}

impl std::fmt::Debug for CatalogClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogClient")
            .field("base_url", &self.config.base_url)
            .field("cache", &self.cache)
            .finish()
    }
}

/// Search hits without a playable video id are dropped.
fn map_search_items(items: Vec<SearchItem>) -> Vec<Track> {
    items
        .into_iter()
        .filter_map(|item| {
            let id = item.id.video_id?;
            Some(item.snippet.into_track(id, None))
        })
        .collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
