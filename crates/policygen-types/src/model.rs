//! Policy model boundary.
//!
//! The definition-file parser lives outside this workspace; what the
//! pipeline needs from it is captured by [`PolicyModel`]. [`PolicyFile`] and
//! [`PolicyDirectory`] implement it over already-parsed definitions stored
//! as JSON or YAML.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::cancel::CancelToken;
use crate::error::{ModelError, ModelResult};
use crate::policy::Policy;

/// Policies exposed by a loaded model.
#[derive(Clone, Copy, Debug)]
pub enum PolicySet<'a> {
    /// Single-file model.
    Single(&'a Policy),
    /// Directory model, in the order the model yields them.
    Many(&'a [Policy]),
}

impl<'a> PolicySet<'a> {
    /// Iterate the policies in model order.
    pub fn iter(&self) -> std::slice::Iter<'a, Policy> {
        match *self {
            Self::Single(policy) => std::slice::from_ref(policy).iter(),
            Self::Many(policies) => policies.iter(),
        }
    }

    /// Number of policies.
    pub fn len(&self) -> usize {
        match self {
            Self::Single(_) => 1,
            Self::Many(policies) => policies.len(),
        }
    }

    /// Whether no policy is exposed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A parsed, loadable set of policy definitions.
#[async_trait]
pub trait PolicyModel: Send + Sync {
    /// Whether `load` has completed.
    fn is_loaded(&self) -> bool;

    /// Load the definitions.
    async fn load(&mut self, cancel: &CancelToken) -> ModelResult<()>;

    /// Loaded policies.
    ///
    /// Fails with [`ModelError::NotLoaded`] before `load`.
    fn policies(&self) -> ModelResult<PolicySet<'_>>;
}

// ── File adapters ──────────────────────────────────────────────────────

fn is_definition_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("json" | "yaml" | "yml")
    )
}

async fn read_policy(path: &Path) -> ModelResult<Policy> {
    let text = tokio::fs::read_to_string(path).await?;
    let decoded = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&text).map_err(|e| e.to_string()),
        _ => serde_yaml::from_str(&text).map_err(|e| e.to_string()),
    };
    decoded.map_err(|message| ModelError::Decode {
        path: path.to_path_buf(),
        message,
    })
}

/// One definition file holding one policy.
#[derive(Debug)]
pub struct PolicyFile {
    path: PathBuf,
    policy: Option<Policy>,
}

impl PolicyFile {
    /// Unloaded model over `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policy: None,
        }
    }

    /// Already-loaded model over an in-memory policy.
    pub fn from_policy(policy: Policy) -> Self {
        Self {
            path: PathBuf::new(),
            policy: Some(policy),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PolicyModel for PolicyFile {
    fn is_loaded(&self) -> bool {
        self.policy.is_some()
    }

    async fn load(&mut self, cancel: &CancelToken) -> ModelResult<()> {
        if !is_definition_file(&self.path) {
            return Err(ModelError::InvalidPath(self.path.clone()));
        }
        cancel.check()?;
        let policy = read_policy(&self.path).await?;
        tracing::debug!(path = %self.path.display(), policy = %policy.name, "Loaded policy file");
        self.policy = Some(policy);
        Ok(())
    }

    fn policies(&self) -> ModelResult<PolicySet<'_>> {
        self.policy
            .as_ref()
            .map(PolicySet::Single)
            .ok_or_else(|| ModelError::NotLoaded(self.path.display().to_string()))
    }
}

/// Every definition file of a directory, one policy per file.
///
/// Files are read in lexicographic file-name order so that repeated runs
/// over the same directory render identical source.
#[derive(Debug)]
pub struct PolicyDirectory {
    path: PathBuf,
    policies: Option<Vec<Policy>>,
}

impl PolicyDirectory {
    /// Unloaded model over `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policies: None,
        }
    }

    /// Already-loaded model over in-memory policies, kept in the given order.
    pub fn from_policies(policies: Vec<Policy>) -> Self {
        Self {
            path: PathBuf::new(),
            policies: Some(policies),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PolicyModel for PolicyDirectory {
    fn is_loaded(&self) -> bool {
        self.policies.is_some()
    }

    async fn load(&mut self, cancel: &CancelToken) -> ModelResult<()> {
        cancel.check()?;
        let mut entries = tokio::fs::read_dir(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ModelError::InvalidPath(self.path.clone())
            } else {
                ModelError::Io(e)
            }
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_file() && is_definition_file(&path) {
                files.push(path);
            }
        }
        files.sort();

        let mut policies = Vec::with_capacity(files.len());
        for file in &files {
            cancel.check()?;
            policies.push(read_policy(file).await?);
        }
        tracing::debug!(
            path = %self.path.display(),
            count = policies.len(),
            "Loaded policy directory"
        );
        self.policies = Some(policies);
        Ok(())
    }

    fn policies(&self) -> ModelResult<PolicySet<'_>> {
        self.policies
            .as_deref()
            .map(PolicySet::Many)
            .ok_or_else(|| ModelError::NotLoaded(self.path.display().to_string()))
    }
}
