//! Error types for the guardsync system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for guardsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the guardsync system
#[derive(Error, Debug)]
pub enum Error {
    /// Client construction or transport errors
    #[error("Client error: {0}")]
    Client(String),

    /// Non-success response from an instance's control API
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or reason
        message: String,
    },

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The instance has not completed its initial setup
    #[error("Instance setup needed")]
    SetupNeeded,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Instance version is older than the supported minimum
    #[error("Unsupported version {version} on {host}, minimum is {minimum}")]
    UnsupportedVersion {
        /// Instance host
        host: String,
        /// Reported version
        version: String,
        /// Minimum supported version
        minimum: String,
    },

    /// Replica version differs from the origin version
    #[error("Version mismatch: origin {origin}, replica {replica}")]
    VersionMismatch {
        /// Origin version
        origin: String,
        /// Replica version
        replica: String,
    },

    /// A sync pass is already running on this engine
    #[error("Sync already in progress")]
    SyncInProgress,

    /// The origin snapshot lacks a resource an action needs
    #[error("Origin snapshot is missing {0}")]
    MissingSnapshot(&'static str),

    /// One or more item writes failed while continue-on-error was enabled
    #[error("{action}: {} item(s) failed: {}", .failures.len(), .failures.join("; "))]
    ItemFailures {
        /// Action name
        action: &'static str,
        /// One message per failed item
        failures: Vec<String>,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a client error
    pub fn client(msg: impl Into<String>) -> Self {
        Self::Client(msg.into())
    }

    /// Create an API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an unsupported version error
    pub fn unsupported_version(
        host: impl Into<String>,
        version: impl Into<String>,
        minimum: impl Into<String>,
    ) -> Self {
        Self::UnsupportedVersion {
            host: host.into(),
            version: version.into(),
            minimum: minimum.into(),
        }
    }

    /// Create a version mismatch error
    pub fn version_mismatch(origin: impl Into<String>, replica: impl Into<String>) -> Self {
        Self::VersionMismatch {
            origin: origin.into(),
            replica: replica.into(),
        }
    }

    /// Whether this error means the instance is waiting for initial setup
    pub fn is_setup_needed(&self) -> bool {
        matches!(self, Self::SetupNeeded)
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
