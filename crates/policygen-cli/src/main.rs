//! policygen CLI - compile administrative policy definitions into a C# assembly
//!
//! Loads one definition file or a directory of them, renders the policies
//! to C#, resolves the runtime's reference assemblies and compiles
//! `<ASSEMBLY_NAME>.dll` with its symbols and documentation into the output
//! directory. Optionally writes a build log, a consumer project and a
//! LINQPad script next to it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser};
use policygen_build::{
    write_build_log, write_linqpad_script, write_sdk_project, AssemblyEmitter, CompilerBackend,
    CscBackend, SimulatedBackend,
};
use policygen_refs::{
    DotnetRuntimeProbe, FixedRuntime, PackageCache, PackageFetcher, ReferenceResolver, RuntimeProbe,
};
use policygen_types::{CancelToken, PolicyDirectory, PolicyFile, PolicyModel};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;

use config::PolicygenConfig;
use error::{CliError, CliResult};

/// policygen CLI application
#[derive(Parser)]
#[command(name = "policygen")]
#[command(about = "Administrative policy definitions to compiled C# assemblies", long_about = None)]
#[command(version)]
struct Cli {
    /// Output assembly name
    assembly_name: String,

    /// Definition file (.json, .yaml) or directory of definition files
    input_path: PathBuf,

    /// Output directory
    output_path: PathBuf,

    /// Generate an SDK style .csproj with this project name
    #[arg(long, value_name = "PROJECT_NAME")]
    generate_csproj: Option<String>,

    /// Generate a LINQPad script with this file name
    #[arg(long, value_name = "SCRIPT_FILE")]
    generate_linqpad: Option<String>,

    /// Generate a build log file
    #[arg(long, default_value_t = true, action = ArgAction::Set, value_name = "BOOL")]
    generate_buildlog: bool,

    /// Configuration file path
    #[arg(short, long, env = "POLICYGEN_CONFIG")]
    config: Option<PathBuf>,

    /// Runtime to compile against instead of the installed one, e.g. ".NET 8.0.4"
    #[arg(long, env = "POLICYGEN_RUNTIME", value_name = "DESCRIPTION")]
    runtime: Option<String>,

    /// Write placeholder artifacts instead of invoking the compiler
    #[arg(long, hide = true)]
    simulate_compiler: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    // Interrupt only requests cancellation; stages unwind on their own
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Cancelling...");
                cancel.cancel();
            }
        });
    }

    match run(cli, &cancel).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) if e.is_cancelled() => {
            eprintln!("Cancelled.");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether the build succeeded.
async fn run(cli: Cli, cancel: &CancelToken) -> CliResult<bool> {
    let config = PolicygenConfig::load(cli.config.as_deref())?;
    let model = load_model(&cli.input_path, cancel).await?;
    let emitter = AssemblyEmitter::new(
        Arc::new(reference_resolver(&cli, &config)?),
        compiler_backend(&cli, &config)?,
    )?;

    let result = emitter
        .emit(model.as_ref(), &cli.assembly_name, &cli.output_path, cancel)
        .await?;

    if !result.build_succeeded {
        eprintln!("Build failed with one or more errors:");
        for diagnostic in &result.diagnostics {
            eprintln!("* {diagnostic}");
        }
        return Ok(false);
    }
    tracing::info!(assembly = %cli.assembly_name, "Build succeeded");
    for diagnostic in &result.diagnostics {
        tracing::warn!("{diagnostic}");
    }

    if cli.generate_buildlog {
        let path = write_build_log(&result).await?;
        tracing::info!(path = %path.display(), "Generated build log");
    }
    if let Some(project) = non_blank(cli.generate_csproj.as_deref()) {
        let files = write_sdk_project(&result, project).await?;
        tracing::info!(path = %files.project.display(), "Generated SDK style project");
    }
    if let Some(script) = non_blank(cli.generate_linqpad.as_deref()) {
        let path = write_linqpad_script(&result, script).await?;
        tracing::info!(path = %path.display(), "Generated LINQPad script");
    }

    Ok(true)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

async fn load_model(path: &Path, cancel: &CancelToken) -> CliResult<Box<dyn PolicyModel>> {
    let mut model: Box<dyn PolicyModel> = if path.is_dir() {
        tracing::info!(path = %path.display(), "Loading policy definitions from directory");
        Box::new(PolicyDirectory::new(path))
    } else if path.is_file() {
        tracing::info!(path = %path.display(), "Loading policy definition file");
        Box::new(PolicyFile::new(path))
    } else {
        return Err(CliError::InvalidInput(format!(
            "'{}' is neither a file nor a directory",
            path.display()
        )));
    };
    model.load(cancel).await?;
    Ok(model)
}

fn reference_resolver(cli: &Cli, config: &PolicygenConfig) -> CliResult<ReferenceResolver> {
    let probe: Box<dyn RuntimeProbe> = match cli.runtime.as_deref().or(config.runtime.as_deref()) {
        Some(description) => Box::new(FixedRuntime(description.parse()?)),
        None => Box::new(DotnetRuntimeProbe::default()),
    };
    let cache = PackageCache::new(config.cache_dir()?);
    let fetcher = PackageFetcher::new(config.package_base_url(), config.request_timeout())?;
    Ok(ReferenceResolver::new(probe, cache, fetcher))
}

fn compiler_backend(cli: &Cli, config: &PolicygenConfig) -> CliResult<Arc<dyn CompilerBackend>> {
    if cli.simulate_compiler {
        return Ok(Arc::new(SimulatedBackend::all_pass()));
    }
    Ok(Arc::new(CscBackend::new(config.compiler_command())?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn buildlog_defaults_on_and_can_be_disabled() {
        let cli = Cli::try_parse_from(["policygen", "Lib", "defs", "out"]).unwrap();
        assert!(cli.generate_buildlog);
        let cli = Cli::try_parse_from(["policygen", "Lib", "defs", "out", "--generate-buildlog", "false"])
            .unwrap();
        assert!(!cli.generate_buildlog);
    }

    #[test]
    fn blank_artifact_names_are_skipped() {
        assert_eq!(non_blank(Some("  ")), None);
        assert_eq!(non_blank(Some("App")), Some("App"));
        assert_eq!(non_blank(None), None);
    }
}
