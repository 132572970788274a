//! Error types for catalog lookups.

use thiserror::Error;

/// Errors surfaced by [`crate::CatalogClient`] operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The request never produced a response (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("catalog API returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The backend asked us to back off.
    #[error("rate limited by catalog API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    /// The response body did not match the expected wire shape.
    #[error("failed to parse catalog response: {0}")]
    JsonParse(String),

    /// A request could not be built from the given arguments.
    #[error("invalid catalog request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
