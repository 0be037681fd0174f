//! Simulated compiler backend.
//!
//! Writes small placeholder artifacts instead of compiling, and reports a
//! configured outcome. Used by tests and dry runs.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{BackendDiagnostic, BackendOutcome, CompilerBackend, EmitRequest, Severity};
use crate::error::BuildResult;

/// A backend with a fixed outcome.
#[derive(Debug)]
pub struct SimulatedBackend {
    succeeds: bool,
    diagnostics: Vec<BackendDiagnostic>,
    calls: AtomicUsize,
}

impl SimulatedBackend {
    pub fn new(succeeds: bool, diagnostics: Vec<BackendDiagnostic>) -> Self {
        Self {
            succeeds,
            diagnostics,
            calls: AtomicUsize::new(0),
        }
    }

    /// Succeeds with no diagnostics.
    pub fn all_pass() -> Self {
        Self::new(true, Vec::new())
    }

    /// Fails with one error on the given zero-based line.
    pub fn compilation_fails(line: usize, message: &str) -> Self {
        Self::new(
            false,
            vec![BackendDiagnostic::new(Severity::Error, "CS0000", message).at(line, 0)],
        )
    }

    /// Number of `emit` calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompilerBackend for SimulatedBackend {
    fn emit(&self, request: &EmitRequest) -> BuildResult<BackendOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(
            assembly = %request.assembly_name,
            references = request.references.len(),
            "Simulated compilation"
        );

        if self.succeeds {
            let name = &request.assembly_name;
            std::fs::write(&request.targets.binary, format!("MZ simulated {name}"))?;
            std::fs::write(&request.targets.symbols, format!("BSJB simulated {name}"))?;
            std::fs::write(
                &request.targets.documentation,
                format!(
                    "<?xml version=\"1.0\"?>\n<doc>\n<assembly><name>{name}</name></assembly>\n<members></members>\n</doc>\n"
                ),
            )?;
        }

        Ok(BackendOutcome {
            success: self.succeeds,
            diagnostics: self.diagnostics.clone(),
        })
    }

    fn name(&self) -> &str {
        "simulated"
    }
}
