//! Integration tests for the catalog client, driven by a scripted HTTP
//! client and a manually stepped clock.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_traits::error::{BridgeError, Result as BridgeResult};
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse};
use bridge_traits::time::Clock;
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use core_runtime::events::EventBus;
use core_runtime::{CacheTtlConfig, CatalogConfig};
use core_catalog::{CatalogClient, CatalogError};

// ===== Harness =====

struct ScriptedHttp {
    responses: Mutex<VecDeque<(u16, String)>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedHttp {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn push(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back((status, body.to_string()));
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn request_url(&self, index: usize) -> String {
        self.requests.lock().unwrap()[index].clone()
    }
}

#[async_trait]
impl HttpClient for ScriptedHttp {
    async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse> {
        self.requests.lock().unwrap().push(request.url.clone());
        let (status, body) = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| BridgeError::OperationFailed("connection refused".into()))?;
        Ok(HttpResponse {
            status,
            headers: HashMap::new(),
            body: Bytes::from(body),
        })
    }
}

struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn new() -> Arc<Self> {
        Arc::new(Self { now: Mutex::new(Utc::now()) })
    }

    fn advance_minutes(&self, minutes: i64) {
        *self.now.lock().unwrap() += Duration::minutes(minutes);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

fn client(http: Arc<ScriptedHttp>, clock: Arc<ManualClock>) -> CatalogClient {
    let config = CatalogConfig {
        api_key: "test-key".to_string(),
        base_url: "https://catalog.test/v3".to_string(),
        region: "US".to_string(),
        max_results: 20,
    };
    CatalogClient::new(http, clock, EventBus::new(16), config, CacheTtlConfig::default())
}

fn search_body(ids: &[&str], next_token: Option<&str>) -> String {
    let items: Vec<String> = ids
        .iter()
        .map(|id| {
            format!(
                r#"{{
                    "id": {{"videoId": "{id}"}},
                    "snippet": {{
                        "title": "Song {id}",
                        "channelTitle": "Channel {id}",
                        "description": "desc",
                        "publishedAt": "2024-05-01T12:00:00Z",
                        "thumbnails": {{
                            "default": {{"url": "https://img.test/{id}/d.jpg"}},
                            "medium": {{"url": "https://img.test/{id}/m.jpg"}},
                            "high": {{"url": "https://img.test/{id}/h.jpg"}}
                        }}
                    }}
                }}"#
            )
        })
        .collect();
    let token = next_token
        .map(|t| format!(r#""nextPageToken": "{t}","#))
        .unwrap_or_default();
    format!(
        r#"{{{token} "pageInfo": {{"totalResults": 1000}}, "items": [{}]}}"#,
        items.join(",")
    )
}

fn videos_body(entries: &[(&str, &str)]) -> String {
    let items: Vec<String> = entries
        .iter()
        .map(|(id, duration)| {
            format!(
                r#"{{
                    "id": "{id}",
                    "snippet": {{
                        "title": "Video {id}",
                        "channelTitle": "Channel",
                        "description": "",
                        "publishedAt": "2024-05-01T12:00:00Z",
                        "thumbnails": {{"medium": {{"url": "https://img.test/{id}/m.jpg"}}}}
                    }},
                    "contentDetails": {{"duration": "{duration}"}}
                }}"#
            )
        })
        .collect();
    format!(r#"{{"items": [{}]}}"#, items.join(","))
}

// ===== Search =====

#[tokio::test]
async fn search_maps_results_and_builds_music_scoped_url() {
    let http = ScriptedHttp::new();
    http.push(200, &search_body(&["abc"], Some("tok2")));
    let client = client(http.clone(), ManualClock::new());

    let page = client.search("lofi beats", None, None).await.unwrap();

    assert_eq!(page.tracks.len(), 1);
    let track = &page.tracks[0];
    assert_eq!(track.id, "abc");
    assert_eq!(track.title, "Song abc");
    assert_eq!(track.artist, "Channel abc");
    assert_eq!(track.thumbnail_url, "https://img.test/abc/m.jpg");
    assert_eq!(track.thumbnail_high_url, "https://img.test/abc/h.jpg");
    assert!(track.published_at.is_some());
    assert_eq!(page.next_page_token.as_deref(), Some("tok2"));
    assert_eq!(page.total_results, 1000);

    let url = http.request_url(0);
    assert!(url.starts_with("https://catalog.test/v3/search?"));
    assert!(url.contains("q=lofi%20beats%20music"));
    assert!(url.contains("videoCategoryId=10"));
    assert!(url.contains("maxResults=20"));
    assert!(url.contains("key=test-key"));
    assert!(!url.contains("pageToken"));
}

#[tokio::test]
async fn search_cache_hit_avoids_second_request() {
    let http = ScriptedHttp::new();
    http.push(200, &search_body(&["abc"], None));
    let client = client(http.clone(), ManualClock::new());

    let first = client.search("lofi", None, None).await.unwrap();
    // Same query after trimming and case folding.
    let second = client.search("  LoFi  ", None, None).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(http.request_count(), 1);
}

#[tokio::test]
async fn search_refetches_after_ttl_expiry() {
    let http = ScriptedHttp::new();
    http.push(200, &search_body(&["abc"], None));
    http.push(200, &search_body(&["xyz"], None));
    let clock = ManualClock::new();
    let client = client(http.clone(), clock.clone());

    client.search("lofi", None, None).await.unwrap();
    clock.advance_minutes(11); // past the 10 minute search TTL
    let page = client.search("lofi", None, None).await.unwrap();

    assert_eq!(http.request_count(), 2);
    assert_eq!(page.tracks[0].id, "xyz");
}

#[tokio::test]
async fn search_exactly_at_ttl_still_hits_the_cache() {
    let http = ScriptedHttp::new();
    http.push(200, &search_body(&["abc"], None));
    let clock = ManualClock::new();
    let client = client(http.clone(), clock.clone());

    client.search("lofi", None, None).await.unwrap();
    clock.advance_minutes(10); // the 10 minute search TTL, on the nose
    let page = client.search("lofi", None, None).await.unwrap();

    assert_eq!(http.request_count(), 1);
    assert_eq!(page.tracks[0].id, "abc");
}

#[tokio::test]
async fn search_pages_cache_independently() {
    let http = ScriptedHttp::new();
    http.push(200, &search_body(&["a"], Some("tok2")));
    http.push(200, &search_body(&["b"], None));
    let client = client(http.clone(), ManualClock::new());

    let first = client.search("lofi", None, None).await.unwrap();
    let second = client
        .search("lofi", None, first.next_page_token.as_deref())
        .await
        .unwrap();

    assert_eq!(http.request_count(), 2);
    assert!(http.request_url(1).contains("pageToken=tok2"));
    assert_eq!(second.tracks[0].id, "b");
}

#[tokio::test]
async fn search_drops_hits_without_video_id() {
    let http = ScriptedHttp::new();
    let body = r#"{
        "items": [
            {"id": {"channelId": "c1"}, "snippet": {"title": "Channel hit", "channelTitle": "x", "thumbnails": {}}},
            {"id": {"videoId": "v1"}, "snippet": {"title": "Video hit", "channelTitle": "y", "thumbnails": {}}}
        ]
    }"#;
    http.push(200, body);
    let client = client(http, ManualClock::new());

    let page = client.search("test", None, None).await.unwrap();
    assert_eq!(page.tracks.len(), 1);
    assert_eq!(page.tracks[0].id, "v1");
}

#[tokio::test]
async fn search_rejects_empty_query_without_network() {
    let http = ScriptedHttp::new();
    let client = client(http.clone(), ManualClock::new());

    let err = client.search("   ", None, None).await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidRequest(_)));
    assert_eq!(http.request_count(), 0);
}

// ===== Popular and categories =====

#[tokio::test]
async fn popular_uses_chart_endpoint_and_caches() {
    let http = ScriptedHttp::new();
    http.push(200, &videos_body(&[("p1", "PT3M20S"), ("p2", "PT4M")]));
    let client = client(http.clone(), ManualClock::new());

    let tracks = client.popular(Some(10)).await.unwrap();
    assert_eq!(tracks.len(), 2);
    // Chart listings do not carry durations.
    assert_eq!(tracks[0].duration_secs, None);

    let url = http.request_url(0);
    assert!(url.contains("/videos?"));
    assert!(url.contains("chart=mostPopular"));
    assert!(url.contains("regionCode=US"));
    assert!(url.contains("maxResults=10"));

    client.popular(Some(10)).await.unwrap();
    assert_eq!(http.request_count(), 1);
}

#[tokio::test]
async fn category_delegates_to_search_and_caches_separately() {
    let http = ScriptedHttp::new();
    http.push(200, &search_body(&["c1"], None));
    let client = client(http.clone(), ManualClock::new());

    let tracks = client.by_category("chill", None).await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert!(http.request_url(0).contains("chill%20lofi%20music%20playlist%20music"));

    client.by_category("chill", None).await.unwrap();
    assert_eq!(http.request_count(), 1);

    let stats = client.cache_stats();
    assert!(stats.keys.iter().any(|k| k.starts_with("category_chill_")));
}

#[tokio::test]
async fn unknown_category_is_rejected() {
    let http = ScriptedHttp::new();
    let client = client(http.clone(), ManualClock::new());

    let err = client.by_category("polka", None).await.unwrap_err();
    assert!(matches!(err, CatalogError::InvalidRequest(_)));
    assert_eq!(http.request_count(), 0);
}

// ===== Details =====

#[tokio::test]
async fn details_parses_duration_and_caches() {
    let http = ScriptedHttp::new();
    http.push(200, &videos_body(&[("v1", "PT3M20S")]));
    let client = client(http.clone(), ManualClock::new());

    let track = client.track_details("v1").await.unwrap().unwrap();
    assert_eq!(track.duration_secs, Some(200));
    assert!(http.request_url(0).contains("part=snippet,contentDetails"));

    client.track_details("v1").await.unwrap();
    assert_eq!(http.request_count(), 1);
}

#[tokio::test]
async fn details_returns_none_for_missing_id() {
    let http = ScriptedHttp::new();
    http.push(200, r#"{"items": []}"#);
    let client = client(http, ManualClock::new());

    assert!(client.track_details("gone").await.unwrap().is_none());
}

#[tokio::test]
async fn details_surfaces_backend_errors() {
    let http = ScriptedHttp::new();
    http.push(403, r#"{"error": {"message": "quota exceeded"}}"#);
    let client = client(http, ManualClock::new());

    let err = client.track_details("v1").await.unwrap_err();
    match err {
        CatalogError::Http { status, .. } => assert_eq!(status, 403),
        other => panic!("expected Http error, got {other:?}"),
    }
}

// ===== Related =====

#[tokio::test]
async fn related_soft_fails_to_empty_on_error() {
    let http = ScriptedHttp::new();
    // No scripted response: the transport errors out.
    let client = client(http.clone(), ManualClock::new());

    let tracks = client.related("v1", None).await.unwrap();
    assert!(tracks.is_empty());
    assert_eq!(http.request_count(), 1);
}

#[tokio::test]
async fn related_returns_and_caches_suggestions() {
    let http = ScriptedHttp::new();
    http.push(200, &search_body(&["r1", "r2"], None));
    let client = client(http.clone(), ManualClock::new());

    let tracks = client.related("v1", Some(5)).await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert!(http.request_url(0).contains("relatedToVideoId=v1"));

    client.related("v1", Some(5)).await.unwrap();
    assert_eq!(http.request_count(), 1);
}

// ===== Rate limiting and cache management =====

#[tokio::test]
async fn rate_limited_response_maps_to_typed_error() {
    let http = ScriptedHttp::new();
    http.push(429, "slow down");
    let client = client(http, ManualClock::new());

    let err = client.search("lofi", None, None).await.unwrap_err();
    assert!(matches!(err, CatalogError::RateLimited { .. }));
}

#[tokio::test]
async fn clear_cache_with_pattern_purges_matching_entries() {
    let http = ScriptedHttp::new();
    http.push(200, &search_body(&["a"], None));
    http.push(200, &videos_body(&[("p1", "PT1M")]));
    http.push(200, &search_body(&["b"], None));
    let client = client(http.clone(), ManualClock::new());

    client.search("lofi", None, None).await.unwrap();
    client.popular(None).await.unwrap();
    assert_eq!(client.cache_stats().size, 2);

    assert_eq!(client.clear_cache(Some("search_")), 1);
    assert_eq!(client.cache_stats().size, 1);

    // Search misses and refetches; popular still hits the cache.
    client.search("lofi", None, None).await.unwrap();
    client.popular(None).await.unwrap();
    assert_eq!(http.request_count(), 3);
}
