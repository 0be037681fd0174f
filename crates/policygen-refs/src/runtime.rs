//! Runtime identification.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use async_trait::async_trait;
use semver::{Prerelease, Version};
use serde::{Deserialize, Serialize};

use crate::error::{RefsError, RefsResult};

/// Managed runtime families, as named by framework descriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeFamily {
    /// `.NET Native` (UWP AOT).
    Native,
    /// `.NET Framework`.
    Framework,
    /// `.NET Core` 1.x–3.x.
    Core,
    /// `.NET` 5 and later.
    Modern,
    Unknown,
}

impl RuntimeFamily {
    /// Classify a framework description such as `".NET 8.0.4"`.
    pub fn classify(description: &str) -> Self {
        let description = description.trim_start();
        if description.starts_with(".NET Native") {
            Self::Native
        } else if description.starts_with(".NET Framework") {
            Self::Framework
        } else if description.starts_with(".NET Core") {
            Self::Core
        } else if description.starts_with(".NET") {
            Self::Modern
        } else {
            Self::Unknown
        }
    }

    /// Whether reference packages are published for this family.
    pub fn is_supported(self) -> bool {
        matches!(self, Self::Core | Self::Modern)
    }

    fn description_prefix(self) -> &'static str {
        match self {
            Self::Native => ".NET Native",
            Self::Framework => ".NET Framework",
            Self::Core => ".NET Core",
            Self::Modern => ".NET",
            Self::Unknown => "Unknown runtime",
        }
    }
}

impl fmt::Display for RuntimeFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description_prefix())
    }
}

/// Family and version of the runtime whose references are compiled against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeIdentity {
    pub family: RuntimeFamily,
    pub version: Version,
}

impl RuntimeIdentity {
    pub fn new(family: RuntimeFamily, version: Version) -> Self {
        Self { family, version }
    }

    /// Identity of a `Microsoft.NETCore.App` runtime version.
    pub fn netcore_app(version: Version) -> Self {
        let family = if version.major >= 5 {
            RuntimeFamily::Modern
        } else {
            RuntimeFamily::Core
        };
        Self { family, version }
    }

    /// Reference packages exist for .NET Core 3.0 onwards.
    pub fn is_supported(&self) -> bool {
        self.family.is_supported() && self.version.major >= 3
    }
}

impl fmt::Display for RuntimeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.version)
    }
}

impl FromStr for RuntimeIdentity {
    type Err = RefsError;

    /// Parse a framework description: `".NET 8.0.4"`, `".NET Core 3.1.32"`,
    /// `".NET Framework 4.8.9181.0"`.
    fn from_str(description: &str) -> RefsResult<Self> {
        let unknown = || RefsError::UnknownRuntime(description.to_string());
        let token = description
            .split_whitespace()
            .rev()
            .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))
            .ok_or_else(unknown)?;
        let version = parse_version(token).ok_or_else(unknown)?;
        Ok(Self::new(RuntimeFamily::classify(description), version))
    }
}

/// Lenient version parsing: missing components are zero, components past
/// the third are dropped, a `-suffix` becomes the prerelease tag.
pub fn parse_version(text: &str) -> Option<Version> {
    if let Ok(version) = Version::parse(text) {
        return Some(version);
    }
    let (core, pre) = match text.split_once('-') {
        Some((core, pre)) => (core, Some(pre)),
        None => (text, None),
    };
    let mut parts = core.split('.').map(str::parse::<u64>);
    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    let mut version = Version::new(major, minor, patch);
    if let Some(pre) = pre {
        version.pre = Prerelease::new(pre).ok()?;
    }
    Some(version)
}

// ── Probes ─────────────────────────────────────────────────────────────

/// Source of the runtime identity to resolve references for.
#[async_trait]
pub trait RuntimeProbe: Send + Sync {
    async fn identify(&self) -> RefsResult<RuntimeIdentity>;
}

/// A preconfigured runtime identity.
#[derive(Clone, Debug)]
pub struct FixedRuntime(pub RuntimeIdentity);

#[async_trait]
impl RuntimeProbe for FixedRuntime {
    async fn identify(&self) -> RefsResult<RuntimeIdentity> {
        Ok(self.0.clone())
    }
}

/// Asks the installed `dotnet` host for its highest shared runtime.
#[derive(Clone, Debug)]
pub struct DotnetRuntimeProbe {
    command: PathBuf,
}

impl DotnetRuntimeProbe {
    pub fn new(command: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for DotnetRuntimeProbe {
    fn default() -> Self {
        Self::new("dotnet")
    }
}

#[async_trait]
impl RuntimeProbe for DotnetRuntimeProbe {
    async fn identify(&self) -> RefsResult<RuntimeIdentity> {
        let output = tokio::process::Command::new(&self.command)
            .arg("--list-runtimes")
            .output()
            .await
            .map_err(|e| RefsError::Probe(format!("{}: {e}", self.command.display())))?;
        if !output.status.success() {
            return Err(RefsError::Probe(format!(
                "{} --list-runtimes exited with {}",
                self.command.display(),
                output.status
            )));
        }
        let listing = String::from_utf8_lossy(&output.stdout);
        let identity = highest_netcore_app(&listing)
            .ok_or_else(|| RefsError::Probe("no Microsoft.NETCore.App runtime installed".into()))?;
        tracing::debug!(runtime = %identity, "Identified installed runtime");
        Ok(identity)
    }
}

/// Highest `Microsoft.NETCore.App` entry of a `dotnet --list-runtimes` listing.
pub fn highest_netcore_app(listing: &str) -> Option<RuntimeIdentity> {
    listing
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            match (fields.next(), fields.next()) {
                (Some("Microsoft.NETCore.App"), Some(version)) => parse_version(version),
                _ => None,
            }
        })
        .max()
        .map(RuntimeIdentity::netcore_app)
}
