//! # Core Configuration Module
//!
//! Provides configuration management for the TuneDeck core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds all necessary dependencies and settings for the core library.
//! It enforces fail-fast validation to ensure all required bridges are provided
//! before initialization.
//!
//! ## Required Dependencies
//!
//! - `HttpClient` - Required for catalog API requests (desktop default: reqwest)
//! - `KvStore` - Required for session persistence
//!
//! ## Optional Dependencies
//!
//! - `MediaPlayerFactory` - Host player provisioning. Unlike the stores, a
//!   missing factory is not a configuration error: the host surface may mount
//!   after the core boots, so the playback engine defers work until it appears.
//! - `Clock` - Time source (defaults to the system clock)
//!
//! When the `desktop-shims` feature is enabled, a reqwest-backed `HttpClient`
//! is injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::{CoreConfig, CatalogConfig};
//! use std::sync::Arc;
//!
//! let config = CoreConfig::builder()
//!     .kv_store(Arc::new(MyKvStore))
//!     .catalog(CatalogConfig::new("api-key"))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, HttpClient, KvStore, MediaPlayerFactory, SystemClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Core configuration for the TuneDeck core.
///
/// This struct holds all dependencies and settings required to initialize
/// the core library. Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// HTTP client for catalog API requests (required)
    pub http_client: Arc<dyn HttpClient>,

    /// Durable key-value storage for session persistence (required)
    pub kv_store: Arc<dyn KvStore>,

    /// Host player factory (optional; playback defers until provided)
    pub player_factory: Option<Arc<dyn MediaPlayerFactory>>,

    /// Time source (defaults to the system clock)
    pub clock: Arc<dyn Clock>,

    /// Event bus buffer capacity
    pub event_buffer: usize,

    /// Remote catalog API settings
    pub catalog: CatalogConfig,

    /// Response cache time-to-live settings
    pub cache_ttl: CacheTtlConfig,

    /// Playback engine settings
    pub playback: PlaybackConfig,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("http_client", &"HttpClient { ... }")
            .field("kv_store", &"KvStore { ... }")
            .field(
                "player_factory",
                &self
                    .player_factory
                    .as_ref()
                    .map(|_| "MediaPlayerFactory { ... }"),
            )
            .field("event_buffer", &self.event_buffer)
            .field("catalog", &self.catalog)
            .field("cache_ttl", &self.cache_ttl)
            .field("playback", &self.playback)
            .finish()
    }
}

/// Configuration for the remote video catalog API.
///
/// # Security Note
///
/// API keys should never be hardcoded in the binary. They should be loaded
/// from environment variables or injected via the host platform's secure
/// configuration system.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// API key sent with every catalog request.
    pub api_key: String,

    /// Base URL of the catalog API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Region code used for popularity charts.
    #[serde(default = "default_region")]
    pub region: String,

    /// Default page size for list requests (1-50).
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_base_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_region() -> String {
    "US".to_string()
}

fn default_max_results() -> u32 {
    20
}

impl CatalogConfig {
    /// Creates a catalog configuration with default endpoint settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            region: default_region(),
            max_results: default_max_results(),
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::Config("Catalog API key cannot be empty".to_string()));
        }

        if self.base_url.is_empty() {
            return Err(Error::Config("Catalog base URL cannot be empty".to_string()));
        }

        if self.max_results == 0 || self.max_results > 50 {
            return Err(Error::Config(
                "Catalog max_results must be between 1 and 50".to_string(),
            ));
        }

        Ok(())
    }
}

// The API key must not leak into logs.
impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("api_key", &"***")
            .field("base_url", &self.base_url)
            .field("region", &self.region)
            .field("max_results", &self.max_results)
            .finish()
    }
}

/// Time-to-live settings for the response cache, per request kind.
///
/// Detail lookups change rarely and get the longest TTL; search results are
/// the most volatile and expire first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheTtlConfig {
    /// TTL for popularity charts, in minutes.
    #[serde(default = "default_popular_minutes")]
    pub popular_minutes: u32,

    /// TTL for search result pages, in minutes.
    #[serde(default = "default_search_minutes")]
    pub search_minutes: u32,

    /// TTL for category listings, in minutes.
    #[serde(default = "default_category_minutes")]
    pub category_minutes: u32,

    /// TTL for single-item detail lookups, in minutes.
    #[serde(default = "default_detail_minutes")]
    pub detail_minutes: u32,

    /// TTL for related-item listings, in minutes.
    #[serde(default = "default_related_minutes")]
    pub related_minutes: u32,
}

fn default_popular_minutes() -> u32 {
    30
}

fn default_search_minutes() -> u32 {
    10
}

fn default_category_minutes() -> u32 {
    20
}

fn default_detail_minutes() -> u32 {
    60
}

fn default_related_minutes() -> u32 {
    15
}

impl Default for CacheTtlConfig {
    fn default() -> Self {
        Self {
            popular_minutes: default_popular_minutes(),
            search_minutes: default_search_minutes(),
            category_minutes: default_category_minutes(),
            detail_minutes: default_detail_minutes(),
            related_minutes: default_related_minutes(),
        }
    }
}

impl CacheTtlConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        let ttls = [
            self.popular_minutes,
            self.search_minutes,
            self.category_minutes,
            self.detail_minutes,
            self.related_minutes,
        ];

        if ttls.iter().any(|&ttl| ttl == 0) {
            return Err(Error::Config(
                "Cache TTLs must be greater than 0 minutes".to_string(),
            ));
        }

        Ok(())
    }
}

/// Settings for the playback engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Interval between position polls while a track is loaded, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// `previous()` restarts the current track instead of going back when
    /// playback has progressed past this many seconds.
    #[serde(default = "default_previous_threshold_secs")]
    pub previous_threshold_secs: f64,

    /// Volume applied to freshly provisioned players (0-100).
    #[serde(default = "default_volume")]
    pub default_volume: u8,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_previous_threshold_secs() -> f64 {
    3.0
}

fn default_volume() -> u8 {
    50
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            previous_threshold_secs: default_previous_threshold_secs(),
            default_volume: default_volume(),
        }
    }
}

impl PlaybackConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::Config(
                "Poll interval must be greater than 0ms".to_string(),
            ));
        }

        if self.previous_threshold_secs < 0.0 {
            return Err(Error::Config(
                "Previous-track threshold cannot be negative".to_string(),
            ));
        }

        if self.default_volume > 100 {
            return Err(Error::Config(
                "Default volume must be between 0 and 100".to_string(),
            ));
        }

        Ok(())
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    pub fn validate(&self) -> Result<()> {
        if self.event_buffer == 0 {
            return Err(Error::Config(
                "Event buffer capacity must be greater than 0".to_string(),
            ));
        }

        self.catalog.validate()?;
        self.cache_ttl.validate()?;
        self.playback.validate()?;

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client() -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for catalog requests. \
                 Desktop: ensure the 'desktop-shims' feature is enabled to use the default ReqwestHttpClient. \
                 Mobile/Web: inject a platform-native HTTP adapter."
            .to_string(),
    })
}

fn kv_store_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "KvStore".to_string(),
        message: "KvStore implementation is required for session persistence. \
                 Desktop: inject bridge_desktop::SqliteKvStore. \
                 Tests: inject bridge_traits::MemoryKvStore."
            .to_string(),
    }
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then
/// call [`build()`](CoreConfigBuilder::build) to create the final config.
/// The builder validates required dependencies and provides helpful error
/// messages.
#[derive(Default)]
pub struct CoreConfigBuilder {
    http_client: Option<Arc<dyn HttpClient>>,
    kv_store: Option<Arc<dyn KvStore>>,
    player_factory: Option<Arc<dyn MediaPlayerFactory>>,
    clock: Option<Arc<dyn Clock>>,
    event_buffer: Option<usize>,
    catalog: Option<CatalogConfig>,
    cache_ttl: Option<CacheTtlConfig>,
    playback: Option<PlaybackConfig>,
}

impl CoreConfigBuilder {
    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the key-value store implementation (required).
    pub fn kv_store(mut self, store: Arc<dyn KvStore>) -> Self {
        self.kv_store = Some(store);
        self
    }

    /// Sets the host player factory.
    ///
    /// May be omitted; the playback engine defers load requests until the
    /// factory reports the host surface as available.
    pub fn player_factory(mut self, factory: Arc<dyn MediaPlayerFactory>) -> Self {
        self.player_factory = Some(factory);
        self
    }

    /// Sets the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Sets the event bus buffer capacity.
    pub fn event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = Some(capacity);
        self
    }

    /// Sets the remote catalog API settings (required).
    pub fn catalog(mut self, catalog: CatalogConfig) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Sets the response cache TTL settings.
    pub fn cache_ttl(mut self, cache_ttl: CacheTtlConfig) -> Self {
        self.cache_ttl = Some(cache_ttl);
        self
    }

    /// Sets the playback engine settings.
    pub fn playback(mut self, playback: PlaybackConfig) -> Self {
        self.playback = Some(playback);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Returns
    ///
    /// Returns `Ok(CoreConfig)` on success, or an error if:
    /// - Required bridges are missing (HttpClient without desktop-shims, KvStore)
    /// - Configuration values are invalid
    pub fn build(self) -> Result<CoreConfig> {
        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client()?,
        };

        let kv_store = self.kv_store.ok_or_else(kv_store_missing_error)?;

        let catalog = self.catalog.ok_or_else(|| {
            Error::Config("Catalog configuration is required. Use .catalog() to set it.".to_string())
        })?;

        let config = CoreConfig {
            http_client,
            kv_store,
            player_factory: self.player_factory,
            clock: self
                .clock
                .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>),
            event_buffer: self
                .event_buffer
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            catalog,
            cache_ttl: self.cache_ttl.unwrap_or_default(),
            playback: self.playback.unwrap_or_default(),
        };

        config.validate()?;

        Ok(config)
    }
}
