//! `csc` process backend.
//!
//! Reference images are written into a scratch directory for the duration of
//! one compilation, then the configured compiler command is run with
//! `-nostdlib+` so that only those references are visible. Diagnostics are
//! parsed from the compiler's canonical `file(line,col): severity CODE: text`
//! output.

use std::collections::HashSet;
use std::ffi::OsString;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use crate::backend::{
    BackendDiagnostic, BackendOutcome, CompilerBackend, EmitRequest, Severity, SourceLocation,
};
use crate::error::{BuildError, BuildResult};

static LOCATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<file>.+?)\((?P<line>\d+),(?P<col>\d+)(?:,\d+,\d+)?\): (?P<severity>error|warning|info|hidden) (?P<code>[A-Za-z]+\d+): (?P<message>.*)$",
    )
    .expect("valid located diagnostic regex")
});

static UNLOCATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?P<origin>[^:]+) : )?(?P<severity>error|warning|info|hidden) (?P<code>[A-Za-z]+\d+): (?P<message>.*)$",
    )
    .expect("valid unlocated diagnostic regex")
});

/// Runs an external C# compiler.
#[derive(Clone, Debug)]
pub struct CscBackend {
    /// Program followed by leading arguments, e.g.
    /// `["dotnet", "/usr/share/dotnet/sdk/8.0.404/Roslyn/bincore/csc.dll"]`.
    command: Vec<String>,
}

impl CscBackend {
    pub fn new(command: Vec<String>) -> BuildResult<Self> {
        if command.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(BuildError::InvalidName {
                what: "compiler command",
                reason: "must name a program".into(),
            });
        }
        Ok(Self { command })
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    /// Compiler arguments for `request`, references living in `ref_dir`.
    fn arguments(&self, request: &EmitRequest, ref_dir: &Path) -> BuildResult<Vec<OsString>> {
        let mut args: Vec<OsString> = self.command[1..].iter().map(OsString::from).collect();
        for flag in [
            "-nologo",
            "-noconfig",
            "-nostdlib+",
            "-target:library",
            "-deterministic",
            "-debug:portable",
            "-langversion:latest",
            "-utf8output",
        ] {
            args.push(flag.into());
        }
        args.push(option("-out:", &request.targets.binary));
        args.push(option("-pdb:", &request.targets.symbols));
        args.push(option("-doc:", &request.targets.documentation));

        let mut seen = HashSet::new();
        for image in &request.references {
            if !seen.insert(image.name.as_str()) {
                tracing::warn!(reference = %image.name, "Skipping duplicate reference");
                continue;
            }
            let path = ref_dir.join(&image.name);
            std::fs::write(&path, &image.bytes)?;
            args.push(option("-reference:", &path));
        }

        args.push(request.source_path.clone().into_os_string());
        Ok(args)
    }
}

impl Default for CscBackend {
    fn default() -> Self {
        Self {
            command: vec!["csc".to_string()],
        }
    }
}

fn option(flag: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(flag);
    arg.push(path.as_os_str());
    arg
}

impl CompilerBackend for CscBackend {
    fn emit(&self, request: &EmitRequest) -> BuildResult<BackendOutcome> {
        let ref_dir = tempfile::Builder::new().prefix("policygen-refs").tempdir()?;
        let args = self.arguments(request, ref_dir.path())?;

        tracing::debug!(
            program = %self.command[0],
            references = request.references.len(),
            "Invoking C# compiler"
        );
        let output = Command::new(&self.command[0])
            .args(&args)
            .output()
            .map_err(|e| BuildError::Backend {
                backend: self.name().to_string(),
                message: format!("{}: {e}", self.command[0]),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let diagnostics = parse_diagnostics(&stdout)
            .into_iter()
            .chain(parse_diagnostics(&stderr))
            .collect();

        Ok(BackendOutcome {
            success: output.status.success(),
            diagnostics,
        })
    }

    fn name(&self) -> &str {
        "csc"
    }
}

/// Diagnostics in compiler output, in order. Other lines are ignored.
pub fn parse_diagnostics(output: &str) -> Vec<BackendDiagnostic> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<BackendDiagnostic> {
    let line = line.trim_end();
    if let Some(caps) = LOCATED.captures(line) {
        // Compiler positions are one-based.
        let line_no: usize = caps["line"].parse().ok()?;
        let col_no: usize = caps["col"].parse().ok()?;
        return Some(BackendDiagnostic {
            severity: severity(&caps["severity"]),
            location: Some(SourceLocation {
                line: line_no.saturating_sub(1),
                column: col_no.saturating_sub(1),
            }),
            code: caps["code"].to_string(),
            message: caps["message"].to_string(),
        });
    }
    UNLOCATED.captures(line).map(|caps| {
        BackendDiagnostic::new(severity(&caps["severity"]), &caps["code"], &caps["message"])
    })
}

fn severity(text: &str) -> Severity {
    match text {
        "error" => Severity::Error,
        "warning" => Severity::Warning,
        "info" => Severity::Info,
        _ => Severity::Hidden,
    }
}
