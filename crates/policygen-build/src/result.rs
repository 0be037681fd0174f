//! Outcome of one compilation attempt.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::backend::EmitTargets;

/// Structured result of [`AssemblyEmitter::emit`](crate::AssemblyEmitter::emit).
///
/// Paths, name and output directory are only set when the build succeeded,
/// so a failed attempt can never be mistaken for a usable artifact set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitResult {
    pub assembly_name: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub build_succeeded: bool,
    /// `[ln.N] message - line text`, warnings and errors only.
    pub diagnostics: Vec<String>,
    pub binary_path: Option<PathBuf>,
    pub symbols_path: Option<PathBuf>,
    pub documentation_path: Option<PathBuf>,
}

impl EmitResult {
    pub(crate) fn failed(diagnostics: Vec<String>) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    pub(crate) fn succeeded(
        assembly_name: &str,
        output_dir: PathBuf,
        targets: EmitTargets,
        diagnostics: Vec<String>,
    ) -> Self {
        Self {
            assembly_name: Some(assembly_name.to_string()),
            output_dir: Some(output_dir),
            build_succeeded: true,
            diagnostics,
            binary_path: Some(targets.binary),
            symbols_path: Some(targets.symbols),
            documentation_path: Some(targets.documentation),
        }
    }
}
