//! Policy model error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::cancel::Cancelled;

/// Errors raised while loading or querying a policy model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model was queried before `load` completed.
    #[error("Policy model is not loaded: {0}")]
    NotLoaded(String),

    /// Input path is neither a supported file nor a directory.
    #[error("Invalid input path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// A definition file could not be decoded.
    #[error("Cannot decode '{}': {message}", path.display())]
    Decode {
        /// Offending file.
        path: PathBuf,
        /// Decoder message.
        message: String,
    },

    /// A payload could not be converted into a registry value.
    #[error("Unsupported registry value: {0}")]
    UnsupportedValue(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The invocation was cancelled.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl ModelError {
    /// Whether this error is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Result type for policy model operations.
pub type ModelResult<T> = Result<T, ModelError>;
