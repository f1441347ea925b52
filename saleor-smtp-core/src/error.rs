//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

/// Auth persistence layer error type
///
/// `Clone` because a single in-flight connection attempt hands its outcome
/// to every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum AplError {
    /// Invalid or unusable configuration
    #[error("Invalid APL configuration: {0}")]
    Configuration(String),

    /// Required environment variables for the selected backend are missing
    #[error(
        "Missing required environment variables for {backend} APL configuration: {}",
        missing.join(", ")
    )]
    MissingEnv {
        backend: String,
        missing: Vec<String>,
    },

    /// Backend kind is recognised but not available in this build
    #[error("APL backend \"{0}\" is not available in this build")]
    UnsupportedBackend(String),

    /// CA certificate could not be loaded
    #[error("Failed to read Redis TLS CA certificate from {path}: {message}")]
    TlsCertificate { path: String, message: String },

    /// Transport-level failure to establish a connection
    #[error("Failed to connect to Redis: {0}")]
    Connection(String),

    /// Command failed on an established connection
    #[error("Storage error: {0}")]
    Storage(String),

    /// Stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller supplied invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// No auth data stored for the given Saleor API URL
    #[error("App is not installed for: {0}")]
    NotInstalled(String),
}

impl AplError {
    /// Whether the error is expected behavior (bad input, missing installation) rather than
    /// an operational failure. Used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Validation(_) | Self::NotInstalled(_) => true,
            Self::Configuration(_)
            | Self::MissingEnv { .. }
            | Self::UnsupportedBackend(_)
            | Self::TlsCertificate { .. }
            | Self::Connection(_)
            | Self::Storage(_)
            | Self::Serialization(_) => false,
        }
    }

    /// Whether the error prevents the process from serving traffic at all.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_) | Self::MissingEnv { .. } | Self::UnsupportedBackend(_)
        )
    }
}

impl From<serde_json::Error> for AplError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// APL Result type alias
pub type AplResult<T> = std::result::Result<T, AplError>;
