//! Error taxonomy for the triage library.
//!
//! The library surfaces typed failures; the binary and server layers wrap
//! them in `anyhow`/HTTP responses at the edge. Zero search matches is not
//! an error — `search` returns an empty `Vec` for that case.

use std::time::Duration;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A ticket record is missing a required field. Aborts that record,
    /// never the whole batch.
    #[error("invalid ticket record: {0}")]
    Validation(String),

    /// An embedding, vector-store, or chat call failed (network, auth,
    /// quota, malformed response).
    #[error("provider error: {0}")]
    Provider(String),

    /// An external call exceeded its configured bound. Retryable at the
    /// caller's discretion; not retried internally.
    #[error("provider call timed out after {0:?}")]
    ProviderTimeout(Duration),

    /// A local corpus-file fault (unreadable path, failed seed write).
    /// Filesystem and configuration problems, distinct from remote
    /// provider failures.
    #[error("corpus error: {0}")]
    Corpus(String),

    /// Caller misuse, e.g. `search` with `k <= 0`.
    #[error("usage error: {0}")]
    Usage(String),

    /// A concurrent ingestion trigger was rejected while one is in flight.
    #[error("ingestion already in progress")]
    IngestInProgress,
}

impl Error {
    /// Map a reqwest failure onto the taxonomy, preserving the configured
    /// timeout bound for timeout classification.
    pub fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Error::ProviderTimeout(timeout)
        } else {
            Error::Provider(err.to_string())
        }
    }
}
