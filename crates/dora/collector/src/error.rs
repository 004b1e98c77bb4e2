//! Collector error types.

use dora_store::StoreError;
use thiserror::Error;

/// Errors talking to the catalog or source-hosting APIs.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Rate limit signalled by the remote (HTTP 403)
    #[error("rate limit exceeded")]
    RateLimited,

    /// Unexpected HTTP status
    #[error("api error: status {0}")]
    Status(u16),
}

/// Errors processing one service within a sync cycle.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
