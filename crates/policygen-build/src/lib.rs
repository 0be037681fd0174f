//! # policygen-build
//!
//! Compiles a policy model into an assembly.
//!
//! [`AssemblyEmitter::emit`] renders the model through
//! [`policygen_render::SourceRenderer`], normalizes the source with
//! [`normalize_source`], obtains reference images from a
//! [`ReferenceSource`](policygen_refs::ReferenceSource) and hands everything
//! to a [`CompilerBackend`] on the blocking pool. The [`artifacts`] module
//! writes the optional build log, consumer project and LINQPad script from a
//! successful [`EmitResult`].

#![deny(unsafe_code)]

pub mod artifacts;
pub mod backend;
pub mod csc;
pub mod emitter;
pub mod error;
pub mod normalize;
pub mod result;
pub mod simulated;

pub use artifacts::{write_build_log, write_linqpad_script, write_sdk_project, SdkProject};
pub use backend::{
    BackendDiagnostic, BackendOutcome, CompilerBackend, EmitRequest, EmitTargets, Severity,
    SourceLocation,
};
pub use csc::CscBackend;
pub use emitter::{format_diagnostic, AssemblyEmitter};
pub use error::{BuildError, BuildResult};
pub use normalize::normalize_source;
pub use result::EmitResult;
pub use simulated::SimulatedBackend;
