//! On-disk cache of reference packages, keyed by runtime version.
//!
//! A cached package is trusted once it exists and is non-empty; it is never
//! revalidated. Downloads land in a uniquely named partial file that is
//! renamed into place on completion, so readers never observe a truncated
//! package. Two first-time downloads of the same version race and the last
//! rename wins.

use std::path::{Path, PathBuf};

use semver::Version;
use tokio::io::AsyncWriteExt;

use crate::error::RefsResult;

/// Application directory under the platform's local data directory.
const APP_DIR: &str = "policygen";

/// Directory of cached reference packages.
#[derive(Clone, Debug)]
pub struct PackageCache {
    dir: PathBuf,
}

impl PackageCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<local data dir>/policygen`, when the platform has one.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join(APP_DIR))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Cache file for one runtime version.
    pub fn package_path(&self, version: &Version) -> PathBuf {
        self.dir.join(format!("AppRef_{version}_Package.zip"))
    }

    /// Create the cache directory if absent.
    pub async fn ensure_dir(&self) -> RefsResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    /// Whether a non-empty package is cached for `version`.
    pub async fn is_usable(&self, version: &Version) -> bool {
        match tokio::fs::metadata(self.package_path(version)).await {
            Ok(meta) => meta.is_file() && meta.len() > 0,
            Err(_) => false,
        }
    }

    /// Open a partial file that becomes the package for `version` on commit.
    pub async fn create_partial(&self, version: &Version) -> RefsResult<PartialPackage> {
        let path = self
            .dir
            .join(format!(".AppRef_{version}_{}.partial", uuid::Uuid::new_v4()));
        let file = tokio::fs::File::create(&path).await?;
        Ok(PartialPackage {
            path,
            target: self.package_path(version),
            file,
            written: 0,
        })
    }
}

/// A package download in progress.
#[derive(Debug)]
pub struct PartialPackage {
    path: PathBuf,
    target: PathBuf,
    file: tokio::fs::File,
    written: u64,
}

impl PartialPackage {
    pub async fn write(&mut self, chunk: &[u8]) -> RefsResult<()> {
        self.file.write_all(chunk).await?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and rename into the cache slot. Returns the package path.
    pub async fn commit(mut self) -> RefsResult<PathBuf> {
        self.file.flush().await?;
        self.file.sync_all().await?;
        drop(self.file);
        tokio::fs::rename(&self.path, &self.target).await?;
        Ok(self.target)
    }

    /// Remove the partial file.
    pub async fn discard(self) {
        drop(self.file);
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial package");
        }
    }
}
