//! Logging system demonstration
//!
//! This example shows how to use the logging infrastructure in different modes.
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Compact format
//! cargo run --example logging_demo -- compact
//!
//! # With custom filter
//! cargo run --example logging_demo -- pretty "core_runtime=trace"
//! ```

use core_runtime::logging::{
    init_logging, redact_if_sensitive, LogFormat, LogLevel, LoggingConfig,
};
use std::env;
use tracing::{debug, error, info, instrument, span, trace, warn, Level};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = if args.len() > 1 {
        match args[1].as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    } else {
        LogFormat::default()
    };

    let filter = args.get(2).cloned();

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_spans(true)
        .with_target(true);

    if let Some(f) = filter {
        config = config.with_filter(f);
    }

    init_logging(config).expect("Failed to initialize logging");

    info!("=== Logging System Demo ===");
    info!(format = ?format, "Logging initialized");

    demo_log_levels();
    demo_structured_logging();
    demo_spans().await;
    demo_redaction();
    demo_instrumentation().await;

    info!("=== Demo Complete ===");
}

fn demo_log_levels() {
    let span = span!(Level::INFO, "log_levels");
    let _enter = span.enter();

    trace!("This is a TRACE level log");
    debug!("This is a DEBUG level log");
    info!("This is an INFO level log");
    warn!("This is a WARN level log");
    error!("This is an ERROR level log");
}

fn demo_structured_logging() {
    let span = span!(Level::INFO, "structured_logging");
    let _enter = span.enter();

    info!("Simple message without fields");

    info!(
        track_id = "dQw4w9WgXcQ",
        title = "Song Title",
        duration_secs = 245,
        "Track information"
    );

    info!(
        queue_len = 7,
        cache_entries = 42,
        cache_hit_rate = 0.95,
        "Playback session metrics"
    );
}

async fn demo_spans() {
    let span = span!(Level::INFO, "catalog_search", query = "lofi");
    let _enter = span.enter();

    info!("Starting catalog search");

    {
        let inner_span = span!(Level::DEBUG, "http_request");
        let _inner = inner_span.enter();

        debug!(status = 200, "Catalog endpoint responded");
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }

    {
        let inner_span = span!(Level::DEBUG, "cache_write");
        let _inner = inner_span.enter();

        debug!(key = "search_lofi_20_first", ttl_minutes = 10, "Cached search page");
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }

    info!(results = 20, "Catalog search completed");
}

fn demo_redaction() {
    let span = span!(Level::INFO, "redaction");
    let _enter = span.enter();

    // These values are redacted by the helper before they reach the log
    let api_key = "secret_api_key_12345";
    let email = "user@example.com";

    info!(
        api_key = %redact_if_sensitive("api_key", api_key),
        email = %redact_if_sensitive("email", email),
        "Sensitive data example"
    );

    // Best practice: don't log sensitive values at all
    info!("Authentication successful for user");
    // Instead of: info!(password = user_password, "Auth successful")
}

#[instrument]
async fn demo_instrumentation() {
    info!("Instrumented function automatically creates spans");

    let tracks = vec!["dQw4w9WgXcQ", "9bZkp7q19f0", "kJQP7kiw5Fk"];
    warm_details(&tracks).await;
}

#[instrument(fields(count = tracks.len()))]
async fn warm_details(tracks: &[&str]) {
    debug!("Prefetching track details");

    for (idx, track_id) in tracks.iter().enumerate() {
        fetch_one(idx, track_id).await;
    }

    info!("All track details prefetched");
}

#[instrument(fields(position = idx))]
async fn fetch_one(idx: usize, track_id: &str) {
    trace!(track_id = %track_id, "Fetching track details");
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
}
