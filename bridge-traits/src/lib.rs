//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the core library and platform-specific
//! implementations. Each trait represents a capability that the core requires but
//! that must be implemented differently per platform (desktop, mobile, web).
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP operations with TLS
//! - [`KvStore`](storage::KvStore) - Durable key-value storage for small records
//! - [`MediaPlayer`](player::MediaPlayer) / [`MediaPlayerFactory`](player::MediaPlayerFactory) -
//!   Embedded host player control surface
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is
//! missing at configuration time. The one deliberate exception is
//! [`MediaPlayerFactory`](player::MediaPlayerFactory): the host player surface
//! may mount later than the core boots, so factories report
//! [`BridgeError::NotAvailable`] and the core defers the request instead of
//! failing it.
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Platform
//! implementations should convert platform-specific errors to `BridgeError` and
//! provide actionable error messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` bounds to support safe concurrent
//! usage across async tasks.

pub mod error;
pub mod http;
pub mod player;
pub mod storage;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use player::{
    HostPlayerState, MediaPlayer, MediaPlayerFactory, PlayerEvent, PlayerSettings,
};
pub use storage::{KvStore, MemoryKvStore};
pub use time::{Clock, SystemClock};
