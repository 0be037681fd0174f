//! # policygen-render
//!
//! Turns a loaded policy model into one C# compilation unit.
//!
//! - [`escape`]: total, idempotent escaping of type names, identifiers,
//!   namespaces and XML documentation.
//! - [`literal`]: C# literal formatting for every [`Literal`] kind and
//!   `$(type.key)` resource-reference extraction.
//! - [`helpers`]: the handlebars helper registry exposing both to templates,
//!   plus element-kind predicates and casts.
//! - [`SourceRenderer`]: renders banner, per-policy classes and the runtime
//!   support namespace into any `tokio::io::AsyncWrite` sink.
//!
//! [`Literal`]: policygen_types::Literal

#![deny(unsafe_code)]

pub mod engine;
pub mod error;
pub mod escape;
pub mod helpers;
pub mod literal;

pub use engine::{using_references, SourceRenderer, RUNTIME_NAMESPACE};
pub use error::{RenderError, RenderResult};
pub use escape::{escape_identifier, escape_namespace, escape_type, escape_xmldoc};
pub use literal::{literal, ref_id};
