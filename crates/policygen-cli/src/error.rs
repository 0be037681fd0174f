//! CLI error types

use policygen_build::BuildError;
use policygen_refs::RefsError;
use policygen_types::ModelError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Refs(#[from] RefsError),

    #[error(transparent)]
    Build(#[from] BuildError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the run stopped because of an interrupt.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Model(e) => e.is_cancelled(),
            Self::Refs(e) => e.is_cancelled(),
            Self::Build(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
