//! # policygen-types
//!
//! Shared vocabulary of the policygen pipeline.
//!
//! - [`Policy`] and its ordered [`ElementItem`]s: the already-parsed policy
//!   definitions the rest of the pipeline renders and compiles.
//! - [`RegistryValue`] and [`Literal`]: the payloads that end up as C#
//!   literals, including the delete-sentinel.
//! - [`PolicyModel`]: the boundary the external definition parser implements,
//!   with [`PolicyFile`] / [`PolicyDirectory`] adapters reading serde JSON/YAML.
//! - [`CancelToken`]: the single cancellation signal threaded through every
//!   await point of one invocation.

#![deny(unsafe_code)]

pub mod cancel;
pub mod element;
pub mod error;
pub mod model;
pub mod policy;
pub mod value;

pub use cancel::{CancelToken, Cancelled};
pub use element::{
    BooleanElement, DecimalElement, ElementItem, ElementKind, EnumerationElement,
    EnumerationItem, ListElement, LongDecimalElement, MultiTextElement, TextElement,
};
pub use error::{ModelError, ModelResult};
pub use model::{PolicyDirectory, PolicyFile, PolicyModel, PolicySet};
pub use policy::{Policy, PolicyClass};
pub use value::{Literal, RegistryValue};
