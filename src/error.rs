//! Error types for feedcast.

use thiserror::Error;

/// Common error type for feedcast.
#[derive(Error, Debug)]
pub enum FeedcastError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration is missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for config text or URLs.
    #[error("validation error: {0}")]
    Validation(String),

    /// A single feed could not be fetched or parsed.
    ///
    /// Contained by the cycle controller: the feed contributes no items.
    #[error("fetch error: {0}")]
    Fetch(String),

    /// The delivery channel rejected the message or could not be reached.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// A collaborator call did not finish in time.
    #[error("{operation} timed out after {secs}s")]
    Timeout {
        /// Name of the operation that timed out.
        operation: &'static str,
        /// Bound that was exceeded, in seconds.
        secs: u64,
    },
}

/// Result type alias for feedcast operations.
pub type Result<T> = std::result::Result<T, FeedcastError>;
