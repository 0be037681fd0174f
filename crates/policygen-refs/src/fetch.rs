//! HTTP client for the reference package feed.

use std::time::Duration;

use reqwest::Client;
use semver::Version;

use crate::cache::PartialPackage;
use crate::error::{RefsError, RefsResult};
use policygen_types::CancelToken;

/// Public NuGet v2 package endpoint.
pub const DEFAULT_PACKAGE_BASE_URL: &str = "https://www.nuget.org/api/v2/package";

/// Package carrying the runtime's reference assemblies.
pub const REFERENCE_PACKAGE_ID: &str = "Microsoft.NETCore.App.Ref";

/// Default timeout for one package download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Downloads reference packages from a NuGet-style feed.
#[derive(Clone, Debug)]
pub struct PackageFetcher {
    client: Client,
    base_url: String,
}

impl PackageFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> RefsResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("policygen/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/Microsoft.NETCore.App.Ref/<version>`
    pub fn package_url(&self, version: &Version) -> String {
        format!("{}/{}/{}", self.base_url, REFERENCE_PACKAGE_ID, version)
    }

    /// Stream the package for `version` into `partial`.
    ///
    /// Cancellation is observed between chunks and while waiting for the
    /// next one. Returns the number of bytes written.
    pub async fn fetch_into(
        &self,
        version: &Version,
        partial: &mut PartialPackage,
        cancel: &CancelToken,
    ) -> RefsResult<u64> {
        let url = self.package_url(version);
        tracing::info!(url = %url, "Downloading reference package");

        let download_error = |source| RefsError::Download {
            url: url.clone(),
            source,
        };

        let mut response = tokio::select! {
            response = self.client.get(&url).send() => response.map_err(download_error)?,
            _ = cancel.cancelled() => return Err(policygen_types::Cancelled.into()),
        };
        response = response.error_for_status().map_err(download_error)?;

        loop {
            cancel.check()?;
            let chunk = tokio::select! {
                chunk = response.chunk() => chunk.map_err(download_error)?,
                _ = cancel.cancelled() => return Err(policygen_types::Cancelled.into()),
            };
            match chunk {
                Some(bytes) => partial.write(&bytes).await?,
                None => break,
            }
        }

        tracing::debug!(url = %url, bytes = partial.written(), "Reference package downloaded");
        Ok(partial.written())
    }
}

impl Default for PackageFetcher {
    fn default() -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_PACKAGE_BASE_URL.to_string(),
        }
    }
}
