//! Compiler backend boundary.
//!
//! A backend receives one normalized compilation unit plus its reference
//! images and emits the binary, symbols and documentation side by side. It
//! reports a success flag of its own and every diagnostic it produced;
//! filtering and formatting happen in the emitter.

use std::fmt;
use std::path::{Path, PathBuf};

use policygen_refs::ReferenceImage;
use serde::{Deserialize, Serialize};

use crate::error::BuildResult;

// ── Diagnostics ────────────────────────────────────────────────────────

/// Diagnostic severity, lowest first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Whether diagnostics of this severity reach the caller.
    pub fn is_reported(self) -> bool {
        self >= Self::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Hidden => "hidden",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Zero-based position in the compiled source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

/// One diagnostic as reported by a backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDiagnostic {
    pub severity: Severity,
    /// `None` for diagnostics not tied to the source (e.g. option errors).
    pub location: Option<SourceLocation>,
    pub code: String,
    pub message: String,
}

impl BackendDiagnostic {
    pub fn new(severity: Severity, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            location: None,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.location = Some(SourceLocation { line, column });
        self
    }
}

// ── Requests and outcomes ──────────────────────────────────────────────

/// The three files one compilation emits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitTargets {
    pub binary: PathBuf,
    pub symbols: PathBuf,
    pub documentation: PathBuf,
}

impl EmitTargets {
    /// `<dir>/<asm>.dll`, `<dir>/<asm>.pdb`, `<dir>/<asm>.xml`
    pub fn in_dir(dir: &Path, assembly_name: &str) -> Self {
        Self {
            binary: dir.join(format!("{assembly_name}.dll")),
            symbols: dir.join(format!("{assembly_name}.pdb")),
            documentation: dir.join(format!("{assembly_name}.xml")),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        [&self.binary, &self.symbols, &self.documentation]
            .into_iter()
            .map(PathBuf::as_path)
    }
}

/// Everything a backend needs for one compilation.
#[derive(Clone, Debug)]
pub struct EmitRequest {
    /// Path of the normalized source file on disk.
    pub source_path: PathBuf,
    /// The same source, already in memory.
    pub source: String,
    pub assembly_name: String,
    pub references: Vec<ReferenceImage>,
    pub targets: EmitTargets,
}

/// What a backend reports back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackendOutcome {
    pub success: bool,
    /// In the order the backend produced them.
    pub diagnostics: Vec<BackendDiagnostic>,
}

// ── CompilerBackend Trait ──────────────────────────────────────────────

/// A C# compiler.
///
/// `emit` blocks for the whole compilation; the emitter runs it on the
/// blocking pool. Errors are reserved for failing to run the compiler at
/// all. Compile errors are diagnostics with `success == false`.
pub trait CompilerBackend: Send + Sync {
    fn emit(&self, request: &EmitRequest) -> BuildResult<BackendOutcome>;

    /// Name of this backend for logging.
    fn name(&self) -> &str;
}
