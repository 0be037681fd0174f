//! Error types for source rendering.

use policygen_types::{Cancelled, ModelError};
use thiserror::Error;

/// Errors raised while rendering a policy model to C# source.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The model could not be queried (typically: not loaded).
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The assembly name escapes to an empty namespace.
    #[error("Invalid assembly name: '{0}'")]
    InvalidAssemblyName(String),

    /// A policy's name or namespace escapes to nothing.
    #[error("Invalid policy '{name}': {reason}")]
    InvalidPolicy {
        /// Raw policy name.
        name: String,
        /// What was wrong with it.
        reason: String,
    },

    /// An embedded template failed to parse.
    #[error("Template error: {0}")]
    Template(#[from] handlebars::TemplateError),

    /// A template failed to render (including helper failures).
    #[error("Render failed: {0}")]
    Render(#[from] handlebars::RenderError),

    /// The template context could not be built.
    #[error("Context serialization failed: {0}")]
    Context(#[from] serde_json::Error),

    /// The output sink failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The invocation was cancelled.
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl RenderError {
    /// Whether this error is a cancellation rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled(_) => true,
            Self::Model(e) => e.is_cancelled(),
            _ => false,
        }
    }
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
