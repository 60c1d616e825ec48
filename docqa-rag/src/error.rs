//! Error types for the `docqa-rag` crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading, indexing, retrieving, or answering.
#[derive(Debug, Error)]
pub enum RagError {
    /// The corpus path is missing or a document could not be read.
    #[error("I/O error at {}: {source}", path.display())]
    IoError {
        /// The path that failed.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No usable credential for a remote provider.
    #[error("Authentication error ({provider}): {message}")]
    AuthError {
        /// The provider that rejected or lacked the credential.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A remote embedding or completion call failed.
    ///
    /// Covers network failures, rate limiting, and malformed responses.
    #[error("Service error ({provider}): {message}")]
    ServiceError {
        /// The provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },
}

impl RagError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError { path: path.into(), source }
    }

    pub(crate) fn service(provider: &str, message: impl Into<String>) -> Self {
        Self::ServiceError { provider: provider.to_string(), message: message.into() }
    }

    pub(crate) fn auth(provider: &str, message: impl Into<String>) -> Self {
        Self::AuthError { provider: provider.to_string(), message: message.into() }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
