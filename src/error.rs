//! Muninn error types.

use std::time::Duration;

/// Muninn error types.
///
/// `RateLimited` and `NotFound` are part of the lookup contract (429 and
/// 404 at the HTTP edge); everything else is an internal failure (500).
/// None of these are retried internally; each request independently
/// re-attempts.
#[derive(Debug, thiserror::Error)]
pub enum MuninnError {
    /// Rate limit exceeded with no cached result to fall back on.
    #[error("rate limited")]
    RateLimited,

    /// The identifier has no backing row. Never cached, so never sticky.
    #[error("no such latest-file entry")]
    NotFound,

    /// Backing store transport or query failure.
    #[error("store error: {0}")]
    Store(String),

    /// The backing store did not respond within the configured bound.
    #[error("store fetch timed out after {0:?}")]
    Timeout(Duration),

    /// A stored pattern failed to compile as a regular expression. This
    /// is a data error, not a caller error, even though a caller's
    /// lookup triggered it.
    #[error("stored pattern failed to compile: {0}")]
    Pattern(String),

    /// A stored row was missing an attribute or held the wrong type.
    #[error("attribute decoding failed: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for Muninn operations.
pub type Result<T> = std::result::Result<T, MuninnError>;
