//! Error handling for the duochat client

use std::fmt;
use thiserror::Error;

/// Unified error type for the duochat client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// No valid session for an operation that requires one
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The backing collection has not been provisioned on the remote store
    #[error("collection unavailable: {0}")]
    CollectionUnavailable(String),

    /// A referenced document is absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Transient remote failure (network, 5xx, unclassified remote error)
    #[error("transient remote failure: {0}")]
    Transient(String),

    /// Invalid input supplied by the caller
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new unauthenticated error
    pub fn unauthenticated<T: fmt::Display>(msg: T) -> Self {
        Error::Unauthenticated(msg.to_string())
    }

    /// Create a new collection-unavailable error
    pub fn collection_unavailable<T: fmt::Display>(msg: T) -> Self {
        Error::CollectionUnavailable(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new transient error
    pub fn transient<T: fmt::Display>(msg: T) -> Self {
        Error::Transient(msg.to_string())
    }

    /// Create a new invalid-input error
    pub fn invalid_input<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidInput(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Whether the failure means the backing store still needs setup,
    /// as opposed to a generic remote error
    pub fn is_setup_required(&self) -> bool {
        matches!(self, Error::CollectionUnavailable(_))
    }
}
