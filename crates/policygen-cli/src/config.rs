//! CLI configuration

use std::path::{Path, PathBuf};
use std::time::Duration;

use policygen_refs::{PackageCache, DEFAULT_PACKAGE_BASE_URL, DEFAULT_TIMEOUT};
use serde::{Deserialize, Serialize};

use crate::error::{CliError, CliResult};

/// CLI configuration, read from `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct PolicygenConfig {
    /// Reference package cache directory
    pub cache_dir: Option<PathBuf>,

    /// NuGet v2 package endpoint
    pub package_base_url: Option<String>,

    /// Runtime to compile against, e.g. ".NET 8.0.4"
    pub runtime: Option<String>,

    /// Compiler program and leading arguments
    pub compiler_command: Option<Vec<String>>,

    /// Package download timeout in seconds
    pub request_timeout_seconds: Option<u64>,
}

impl PolicygenConfig {
    /// Load configuration from file; a missing file yields the defaults
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_config_path()?,
        };

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: PolicygenConfig = toml::from_str(&contents)
                .map_err(|e| CliError::Config(format!("{}: {e}", config_path.display())))?;
            Ok(config)
        } else {
            Ok(PolicygenConfig::default())
        }
    }

    /// Get the default configuration file path
    fn default_config_path() -> CliResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::Config("Cannot find config directory".into()))?;
        Ok(config_dir.join("policygen").join("config.toml"))
    }

    pub fn cache_dir(&self) -> CliResult<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => PackageCache::default_dir()
                .ok_or_else(|| CliError::Config("Cannot find local data directory".into())),
        }
    }

    pub fn package_base_url(&self) -> &str {
        self.package_base_url
            .as_deref()
            .unwrap_or(DEFAULT_PACKAGE_BASE_URL)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }

    pub fn compiler_command(&self) -> Vec<String> {
        self.compiler_command
            .clone()
            .unwrap_or_else(|| vec!["csc".to_string()])
    }
}
