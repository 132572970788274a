//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! This crate provides production-ready implementations of the bridge traits
//! using desktop-appropriate libraries:
//! - `HttpClient` using `reqwest`
//! - `KvStore` using a SQLite-backed key-value table
//!
//! The `MediaPlayerFactory` bridge has no desktop default here: it wraps
//! whatever embedded player widget the host application ships, so the host
//! injects its own implementation.
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, SqliteKvStore};
//!
//! #[tokio::main]
//! async fn main() {
//!     let http_client = ReqwestHttpClient::new();
//!     let kv = SqliteKvStore::new("/path/to/tunedeck.db".into()).await.unwrap();
//!
//!     // Use in core configuration
//! }
//! ```

mod http;
mod kv;

pub use http::ReqwestHttpClient;
pub use kv::SqliteKvStore;
