//! Error types for reference resolution.

use std::path::PathBuf;

use policygen_types::Cancelled;
use thiserror::Error;

/// Errors raised while identifying the runtime or obtaining its references.
#[derive(Debug, Error)]
pub enum RefsError {
    /// The runtime family has no reference package.
    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    /// A runtime description could not be parsed.
    #[error("Unrecognized runtime description: '{0}'")]
    UnknownRuntime(String),

    /// The runtime probe failed to run or produced nothing usable.
    #[error("Runtime probe failed: {0}")]
    Probe(String),

    /// The package download failed (transport or HTTP status).
    #[error("Failed to download '{url}': {source}")]
    Download {
        /// Requested package URL.
        url: String,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client construction failed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// The cached package is not a readable archive.
    #[error("Cannot read reference package: {0}")]
    Package(#[from] zip::result::ZipError),

    /// The package holds no reference assemblies.
    #[error("Cannot obtain runtime reference assemblies from {}", .0.display())]
    NoReferences(PathBuf),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking archive read panicked or was aborted.
    #[error("Archive task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The invocation was cancelled.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl RefsError {
    /// Whether this error is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Result type for reference resolution.
pub type RefsResult<T> = Result<T, RefsError>;
