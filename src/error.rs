//! Error types for malshare-etl
//!
//! Every pipeline stage reports failures through [`Error`]. The orchestrator
//! folds them into a [`RunOutcome`](crate::types::RunOutcome) so nothing
//! escapes a run as an unhandled fault.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for malshare-etl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for malshare-etl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "MALSHARE_API_KEY")
        key: Option<String>,
    },

    /// Feed extraction failed
    ///
    /// Transport errors, non-success statuses and blank bodies all land here;
    /// `reason` tells them apart without changing control flow.
    #[error("feed extraction failed: {reason}")]
    Fetch {
        /// Why the fetch was rejected
        reason: FetchFailure,
    },

    /// Document store operation failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// HTTP client construction error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Build a configuration error for a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

impl From<FetchFailure> for Error {
    fn from(reason: FetchFailure) -> Self {
        Error::Fetch { reason }
    }
}

/// Reason a feed fetch produced no data
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchFailure {
    /// Connection, TLS, timeout or body-read failure
    #[error("transport error: {message}")]
    Transport {
        /// Underlying client error text
        message: String,
    },

    /// The endpoint answered with a non-success status
    #[error("HTTP status {status}")]
    Status {
        /// HTTP status code returned by the endpoint
        status: u16,
    },

    /// The endpoint answered 2xx with a blank body
    #[error("empty response body")]
    EmptyBody,
}

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to open a connection to the store
    #[error("failed to connect to store: {0}")]
    ConnectionFailed(String),

    /// Database or collection name cannot be used as a namespace
    #[error("invalid {kind} name: {name:?}")]
    InvalidName {
        /// Which name was rejected ("database" or "collection")
        kind: &'static str,
        /// The rejected value
        name: String,
    },

    /// Bulk insert failed
    #[error("bulk insert failed: {0}")]
    WriteFailed(String),

    /// Read query failed
    #[error("query failed: {0}")]
    QueryFailed(String),
}
