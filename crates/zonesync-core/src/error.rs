//! Error types for zonesync
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Login failed or the session token could not be extracted
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The backend zone listing failed
    #[error("Zone enumeration failed: {0}")]
    ZoneEnumeration(#[source] Box<Error>),

    /// Reading the records of a single zone failed
    #[error("Failed to read zone {zone}: {source}")]
    ZoneFetch {
        /// Zone name
        zone: String,
        /// Backend error
        #[source]
        source: Box<Error>,
    },

    /// A change could not be assigned to exactly one zone
    #[error("Planning error: {0}")]
    Planning(String),

    /// A backend mutation failed; the rest of the batch was abandoned
    #[error("Failed to {action} {record} in zone {zone}: {source}")]
    Apply {
        /// Change action (create, update, delete)
        action: String,
        /// Record name
        record: String,
        /// Zone name
        zone: String,
        /// Backend error, unchanged
        #[source]
        source: Box<Error>,
    },

    /// The operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,

    /// The backend already holds the record
    #[error("Record already exists: {0}")]
    AlreadyExists(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Wrap a backend error raised while listing zones
    pub fn zone_enumeration(source: Error) -> Self {
        Self::ZoneEnumeration(Box::new(source))
    }

    /// Wrap a backend error raised while reading one zone
    pub fn zone_fetch(zone: impl Into<String>, source: Error) -> Self {
        Self::ZoneFetch {
            zone: zone.into(),
            source: Box::new(source),
        }
    }

    /// Create a planning error
    pub fn planning(msg: impl Into<String>) -> Self {
        Self::Planning(msg.into())
    }

    /// Wrap a backend error raised by a mutation
    pub fn apply(
        action: impl Into<String>,
        record: impl Into<String>,
        zone: impl Into<String>,
        source: Error,
    ) -> Self {
        Self::Apply {
            action: action.into(),
            record: record.into(),
            zone: zone.into(),
            source: Box::new(source),
        }
    }

    /// Create an "already exists" error
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error is a cancellation, possibly wrapped
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::ZoneEnumeration(source)
            | Self::ZoneFetch { source, .. }
            | Self::Apply { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
