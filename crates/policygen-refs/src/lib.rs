//! # policygen-refs
//!
//! Reference assemblies for compiling generated policy source.
//!
//! The [`ReferenceResolver`] identifies the installed runtime through a
//! [`RuntimeProbe`], downloads the matching `Microsoft.NETCore.App.Ref`
//! package into a [`PackageCache`] on first use, and hands back every
//! `ref/*.dll` image from it. The compilation orchestrator only sees the
//! [`ReferenceSource`] trait, so tests substitute [`StaticReferences`].

#![deny(unsafe_code)]

pub mod cache;
pub mod error;
pub mod fetch;
pub mod resolver;
pub mod runtime;

pub use cache::{PackageCache, PartialPackage};
pub use error::{RefsError, RefsResult};
pub use fetch::{PackageFetcher, DEFAULT_PACKAGE_BASE_URL, DEFAULT_TIMEOUT, REFERENCE_PACKAGE_ID};
pub use resolver::{read_references, ReferenceImage, ReferenceResolver, ReferenceSource, StaticReferences};
pub use runtime::{
    highest_netcore_app, parse_version, DotnetRuntimeProbe, FixedRuntime, RuntimeFamily,
    RuntimeIdentity, RuntimeProbe,
};
