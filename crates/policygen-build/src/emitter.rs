//! Assembly emission: render, normalize, compile, collect diagnostics.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use policygen_refs::ReferenceSource;
use policygen_render::SourceRenderer;
use policygen_types::{CancelToken, Cancelled, PolicyModel};
use tokio::io::AsyncWriteExt;

use crate::backend::{BackendDiagnostic, CompilerBackend, EmitRequest, EmitTargets};
use crate::error::{BuildError, BuildResult};
use crate::normalize::normalize_source;
use crate::result::EmitResult;

/// Drives one policy model through rendering and compilation.
pub struct AssemblyEmitter {
    renderer: SourceRenderer,
    references: Arc<dyn ReferenceSource>,
    backend: Arc<dyn CompilerBackend>,
}

impl std::fmt::Debug for AssemblyEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssemblyEmitter")
            .field("backend", &self.backend.name())
            .finish_non_exhaustive()
    }
}

impl AssemblyEmitter {
    pub fn new(
        references: Arc<dyn ReferenceSource>,
        backend: Arc<dyn CompilerBackend>,
    ) -> BuildResult<Self> {
        Ok(Self {
            renderer: SourceRenderer::new()?,
            references,
            backend,
        })
    }

    /// Compile `model` into `<output_dir>/<assembly_name>.{cs,dll,pdb,xml}`.
    ///
    /// Compile errors are not an `Err`: they come back as an [`EmitResult`]
    /// with `build_succeeded == false` and the formatted diagnostics.
    pub async fn emit<M>(
        &self,
        model: &M,
        assembly_name: &str,
        output_dir: &Path,
        cancel: &CancelToken,
    ) -> BuildResult<EmitResult>
    where
        M: PolicyModel + ?Sized,
    {
        // ── 1. Preconditions ──
        if assembly_name.trim().is_empty() {
            return Err(BuildError::InvalidAssemblyName);
        }
        model.policies()?;
        cancel.check()?;
        tokio::fs::create_dir_all(output_dir).await?;

        // ── 2. References ──
        cancel.check()?;
        let references = self.references.resolve(cancel).await?;
        if references.is_empty() {
            return Err(BuildError::NoReferences);
        }
        tracing::info!(count = references.len(), "Reference assemblies ready");

        // ── 3. Render ──
        let temp_path = output_dir.join(format!("{assembly_name}_temp.cs"));
        cancel.check()?;
        if let Err(e) = self.render_to_file(model, assembly_name, &temp_path, cancel).await {
            remove_quietly(&temp_path).await;
            return Err(e);
        }

        // ── 4. Normalize ──
        cancel.check()?;
        let rendered = tokio::fs::read_to_string(&temp_path).await?;
        let source = normalize_source(&rendered);
        let source_path = source_file(output_dir, assembly_name);
        cancel.check()?;
        tokio::fs::write(&source_path, source.as_bytes()).await?;
        tokio::fs::remove_file(&temp_path).await?;
        tracing::debug!(path = %source_path.display(), "Wrote normalized source");

        // ── 5. Compile ──
        cancel.check()?;
        let targets = EmitTargets::in_dir(output_dir, assembly_name);
        let request = EmitRequest {
            source_path,
            source,
            assembly_name: assembly_name.to_string(),
            references,
            targets: targets.clone(),
        };
        tracing::info!(
            assembly = %assembly_name,
            backend = %self.backend.name(),
            "Compiling"
        );
        let backend = Arc::clone(&self.backend);
        let (request, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = backend.emit(&request);
            (request, outcome)
        })
        .await?;
        let outcome = outcome?;

        if cancel.is_cancelled() {
            for path in targets.iter() {
                remove_quietly(path).await;
            }
            return Err(Cancelled.into());
        }

        // ── 6. Diagnostics ──
        let diagnostics: Vec<String> = outcome
            .diagnostics
            .iter()
            .filter(|d| d.severity.is_reported())
            .map(|d| format_diagnostic(d, &request.source))
            .collect();

        // ── 7/8. Result ──
        tracing::info!(
            assembly = %assembly_name,
            succeeded = outcome.success,
            diagnostics = diagnostics.len(),
            "Build finished"
        );
        if outcome.success {
            Ok(EmitResult::succeeded(
                assembly_name,
                output_dir.to_path_buf(),
                targets,
                diagnostics,
            ))
        } else {
            Ok(EmitResult::failed(diagnostics))
        }
    }

    async fn render_to_file<M>(
        &self,
        model: &M,
        assembly_name: &str,
        path: &Path,
        cancel: &CancelToken,
    ) -> BuildResult<()>
    where
        M: PolicyModel + ?Sized,
    {
        let file = tokio::fs::File::create(path).await?;
        let mut writer = tokio::io::BufWriter::new(file);
        self.renderer
            .render(model, assembly_name, &mut writer, cancel)
            .await?;
        writer.shutdown().await?;
        Ok(())
    }
}

/// `[ln.N] message - line text`, N one-based. Diagnostics without a
/// location resolve to the first line.
pub fn format_diagnostic(diagnostic: &BackendDiagnostic, source: &str) -> String {
    let line = diagnostic.location.map_or(0, |loc| loc.line);
    let text = source.lines().nth(line).unwrap_or("");
    format!("[ln.{}] {} - {}", line + 1, diagnostic.message, text)
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove file"),
    }
}

/// Output file for the normalized source of `assembly_name`.
pub fn source_file(output_dir: &Path, assembly_name: &str) -> PathBuf {
    output_dir.join(format!("{assembly_name}.cs"))
}
