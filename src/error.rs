//! Error taxonomy for the search client.
//!
//! Controllers never let these escape to the UI as panics or raw transport
//! errors: session and feed failures are published as a display-ready
//! [`ErrorInfo`], and a corrupt history snapshot is recovered locally by
//! falling back to an empty store.

use serde::Serialize;
use thiserror::Error;

/// Failure to load a persisted history snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("history snapshot is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("history snapshot version {found} is not supported (expected {expected})")]
    Version { expected: u32, found: u32 },
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// Transport-level failure, including timeouts.
    #[error("network failure: {0}")]
    Network(String),
    /// Non-2xx response from the service.
    #[error("service error {code}: {message}")]
    Service { code: String, message: String },
    #[error("corrupt history snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
    /// The suggestion polling loop ran out of attempts without a terminal payload.
    #[error("suggestion polling budget exhausted")]
    FeedExhausted,
    /// The suggestion push channel ended without a completion signal.
    #[error("suggestion channel closed before completion")]
    FeedClosedAbnormally,
}

/// Display-ready error projection handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl From<&SearchError> for ErrorInfo {
    fn from(err: &SearchError) -> Self {
        let code = match err {
            SearchError::Network(_) => "network_failure",
            SearchError::Service { code, message } => {
                return ErrorInfo { code: code.clone(), message: message.clone() };
            }
            SearchError::Snapshot(_) => "corrupt_snapshot",
            SearchError::FeedExhausted => "feed_exhausted",
            SearchError::FeedClosedAbnormally => "feed_closed",
        };
        ErrorInfo { code: code.to_string(), message: err.to_string() }
    }
}
