//! Error types for assembly emission.

use std::path::PathBuf;

use policygen_refs::RefsError;
use policygen_render::RenderError;
use policygen_types::{Cancelled, ModelError};
use thiserror::Error;

/// Errors raised while rendering, compiling or post-processing an assembly.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Blank assembly name.
    #[error("Assembly name cannot be blank")]
    InvalidAssemblyName,

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Refs(#[from] RefsError),

    /// The reference source produced nothing to compile against.
    #[error("Cannot obtain runtime reference assemblies: the reference source returned none")]
    NoReferences,

    /// The compiler backend could not be run at all.
    #[error("Compiler backend '{backend}' failed: {message}")]
    Backend {
        backend: String,
        message: String,
    },

    /// A post-processor was asked to work from a failed build.
    #[error("Cannot generate {artifact} from a failed build result")]
    BuildFailed {
        artifact: &'static str,
    },

    /// A required output directory is missing.
    #[error("Output directory '{}' does not exist", .0.display())]
    MissingOutputDirectory(PathBuf),

    /// An artifact name argument was rejected.
    #[error("Invalid {what}: {reason}")]
    InvalidName {
        what: &'static str,
        reason: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking compiler task panicked or was aborted.
    #[error("Compiler task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The invocation was cancelled.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl BuildError {
    /// Whether this error, or the stage error it wraps, is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled(_) => true,
            Self::Model(e) => e.is_cancelled(),
            Self::Render(e) => e.is_cancelled(),
            Self::Refs(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// Result type for assembly emission.
pub type BuildResult<T> = Result<T, BuildError>;
