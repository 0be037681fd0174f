//! Reference resolution: identify the runtime, make sure its reference
//! package is cached, and read the reference assemblies out of it.

use std::io::Read;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use policygen_types::CancelToken;

use crate::cache::PackageCache;
use crate::error::{RefsError, RefsResult};
use crate::fetch::PackageFetcher;
use crate::runtime::RuntimeProbe;

/// Archive directory holding reference assemblies.
const REF_PREFIX: &str = "ref/";
const ASSEMBLY_SUFFIX: &str = ".dll";

/// One reference assembly image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReferenceImage {
    /// File name, e.g. `System.Runtime.dll`.
    pub name: String,
    pub bytes: Bytes,
}

impl ReferenceImage {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Supplier of the reference assemblies a compilation links against.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn resolve(&self, cancel: &CancelToken) -> RefsResult<Vec<ReferenceImage>>;
}

/// Resolves references for the current runtime through the package cache.
pub struct ReferenceResolver {
    probe: Box<dyn RuntimeProbe>,
    cache: PackageCache,
    fetcher: PackageFetcher,
}

impl std::fmt::Debug for ReferenceResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceResolver")
            .field("cache", &self.cache)
            .field("fetcher", &self.fetcher)
            .finish_non_exhaustive()
    }
}

impl ReferenceResolver {
    pub fn new(probe: Box<dyn RuntimeProbe>, cache: PackageCache, fetcher: PackageFetcher) -> Self {
        Self {
            probe,
            cache,
            fetcher,
        }
    }

    pub fn cache(&self) -> &PackageCache {
        &self.cache
    }

    /// Path of a usable cached package, downloading it first when needed.
    async fn ensure_package(&self, cancel: &CancelToken) -> RefsResult<PathBuf> {
        cancel.check()?;
        let runtime = self.probe.identify().await?;
        if !runtime.is_supported() {
            return Err(RefsError::PlatformNotSupported(runtime.to_string()));
        }

        cancel.check()?;
        self.cache.ensure_dir().await?;
        let version = &runtime.version;
        if self.cache.is_usable(version).await {
            tracing::debug!(runtime = %runtime, "Using cached reference package");
            return Ok(self.cache.package_path(version));
        }

        cancel.check()?;
        let mut partial = self.cache.create_partial(version).await?;
        match self.fetcher.fetch_into(version, &mut partial, cancel).await {
            Ok(_) => partial.commit().await,
            Err(e) => {
                partial.discard().await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl ReferenceSource for ReferenceResolver {
    async fn resolve(&self, cancel: &CancelToken) -> RefsResult<Vec<ReferenceImage>> {
        let package = self.ensure_package(cancel).await?;

        cancel.check()?;
        let path = package.clone();
        let images = tokio::task::spawn_blocking(move || read_references(&path)).await??;
        if images.is_empty() {
            return Err(RefsError::NoReferences(package));
        }

        tracing::info!(
            package = %package.display(),
            count = images.len(),
            "Resolved reference assemblies"
        );
        Ok(images)
    }
}

/// Every `ref/**.dll` entry of the package, in archive order.
pub fn read_references(package: &Path) -> RefsResult<Vec<ReferenceImage>> {
    let file = std::fs::File::open(package)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut images = Vec::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if !entry.is_file() {
            continue;
        }
        let entry_name = entry.name().to_string();
        if !entry_name.starts_with(REF_PREFIX) || !entry_name.ends_with(ASSEMBLY_SUFFIX) {
            continue;
        }
        let name = entry_name
            .rsplit('/')
            .next()
            .unwrap_or(entry_name.as_str())
            .to_string();

        let mut bytes = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
        entry.read_to_end(&mut bytes)?;
        tracing::debug!(reference = %name, size = bytes.len(), "Read reference assembly");
        images.push(ReferenceImage::new(name, bytes));
    }

    Ok(images)
}

/// A fixed reference set, for tests and offline builds.
#[derive(Clone, Debug, Default)]
pub struct StaticReferences(pub Vec<ReferenceImage>);

#[async_trait]
impl ReferenceSource for StaticReferences {
    async fn resolve(&self, cancel: &CancelToken) -> RefsResult<Vec<ReferenceImage>> {
        cancel.check()?;
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::DEFAULT_TIMEOUT;
    use crate::runtime::{FixedRuntime, RuntimeFamily, RuntimeIdentity};
    use semver::Version;
    use std::io::Write;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};
    use zip::write::SimpleFileOptions;

    fn package_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn sample_package() -> Vec<u8> {
        package_bytes(&[
            ("ref/net8.0/System.Runtime.dll", "MZ-runtime"),
            ("ref/net8.0/System.Runtime.xml", "<doc/>"),
            ("ref/net8.0/System.Collections.dll", "MZ-collections"),
            ("lib/net8.0/Other.dll", "MZ-other"),
            ("Microsoft.NETCore.App.Ref.nuspec", "<package/>"),
        ])
    }

    fn net8() -> RuntimeIdentity {
        RuntimeIdentity::netcore_app(Version::new(8, 0, 4))
    }

    fn resolver(runtime: RuntimeIdentity, cache_dir: &Path, base_url: &str) -> ReferenceResolver {
        ReferenceResolver::new(
            Box::new(FixedRuntime(runtime)),
            PackageCache::new(cache_dir),
            PackageFetcher::new(base_url, DEFAULT_TIMEOUT).unwrap(),
        )
    }

    #[tokio::test]
    async fn reads_cached_package_without_network() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PackageCache::new(dir.path());
        std::fs::write(cache.package_path(&net8().version), sample_package()).unwrap();

        // Unroutable feed: any request would fail the test.
        let resolver = resolver(net8(), dir.path(), "http://127.0.0.1:9");
        let images = resolver.resolve(&CancelToken::new()).await.unwrap();

        let names: Vec<_> = images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["System.Runtime.dll", "System.Collections.dll"]);
        assert_eq!(images[0].bytes, Bytes::from_static(b"MZ-runtime"));
    }

    #[tokio::test]
    async fn downloads_into_cache_on_first_use() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Microsoft.NETCore.App.Ref/8.0.4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(sample_package()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(net8(), dir.path(), &server.uri());
        let images = resolver.resolve(&CancelToken::new()).await.unwrap();
        assert_eq!(images.len(), 2);
        assert!(resolver.cache().is_usable(&net8().version).await);

        // Second resolution is served from the cache.
        let again = resolver.resolve(&CancelToken::new()).await.unwrap();
        assert_eq!(again, images);
    }

    #[tokio::test]
    async fn failed_download_leaves_no_cache_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(net8(), dir.path(), &server.uri());
        let err = resolver.resolve(&CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, RefsError::Download { .. }), "{err}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn package_without_references_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let cache = PackageCache::new(dir.path());
        let package = package_bytes(&[("lib/net8.0/Other.dll", "MZ")]);
        std::fs::write(cache.package_path(&net8().version), package).unwrap();

        let resolver = resolver(net8(), dir.path(), "http://127.0.0.1:9");
        let err = resolver.resolve(&CancelToken::new()).await.unwrap_err();
        assert!(matches!(err, RefsError::NoReferences(_)), "{err}");
    }

    #[tokio::test]
    async fn unsupported_runtime_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let framework = RuntimeIdentity::new(RuntimeFamily::Framework, Version::new(4, 8, 9181));
        let resolver = resolver(framework, dir.path(), "http://127.0.0.1:9");
        let err = resolver.resolve(&CancelToken::new()).await.unwrap_err();
        match err {
            RefsError::PlatformNotSupported(description) => {
                assert_eq!(description, ".NET Framework 4.8.9181")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn cancelled_before_start() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = resolver(net8(), dir.path(), "http://127.0.0.1:9");
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = resolver.resolve(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn static_references_return_their_images() {
        let source = StaticReferences(vec![ReferenceImage::new("a.dll", &b"MZ"[..])]);
        let images = source.resolve(&CancelToken::new()).await.unwrap();
        assert_eq!(images[0].name, "a.dll");
    }
}
