//! # Core Catalog
//!
//! Read-only client for the remote music video catalog. Wraps the backend's
//! search, chart, detail and related-video endpoints behind typed operations,
//! with a per-endpoint TTL response cache in front of the network.
//!
//! The HTTP client and clock are injected through `bridge-traits`, so the
//! crate never opens a socket or reads wall-clock time on its own.

pub mod cache;
pub mod client;
pub mod error;
pub mod models;

pub use cache::{CacheKey, CacheStats, CachedPayload, ResponseCache};
pub use client::CatalogClient;
pub use error::{CatalogError, Result};
pub use models::{category_by_id, MusicCategory, SearchPage, Track, MUSIC_CATEGORIES};
