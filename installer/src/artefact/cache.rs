//! Download cache.
//!
//! Artifacts live at `<cache>/downloads/<token>--<version><ext>`. A cached
//! file is reused only if it still matches the manifest digest; anything
//! else is deleted and fetched again.

use super::download::ArtefactDownloader;
use super::extraction::{ContainerKind, ExtractionError};
use super::verification::{Verification, check_file, verify_or_discard};
use crate::error::Result;
use crate::manifest::PackageManifest;
use crate::manifest::url_template::url_file_name;
use camino::{Utf8Path, Utf8PathBuf};

/// A verified artifact on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedArtifact {
    /// Where the file lives.
    pub path: Utf8PathBuf,
    /// Its container format.
    pub kind: ContainerKind,
    /// Whether an earlier download was reused.
    pub reused: bool,
}

/// Download cache rooted at a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadCache {
    root: Utf8PathBuf,
}

impl DownloadCache {
    /// Creates a cache rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Detects the container format of `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::UnsupportedContainer`] when the URL's file
    /// name has no recognised extension.
    pub fn container_kind(url: &str) -> Result<ContainerKind> {
        let name = url_file_name(url).unwrap_or(url);
        ContainerKind::from_file_name(name).ok_or_else(|| {
            ExtractionError::UnsupportedContainer {
                name: name.to_owned(),
            }
            .into()
        })
    }

    /// Cache path for `manifest`'s artifact.
    ///
    /// # Examples
    ///
    /// ```
    /// use casket::artefact::cache::DownloadCache;
    /// use casket::artefact::extraction::ContainerKind;
    /// use casket::manifest::parse_manifest;
    ///
    /// let manifest = parse_manifest(r#"
    /// token = "demo"
    /// version = "1.2.0"
    /// sha256 = "0000000000000000000000000000000000000000000000000000000000000000"
    /// url = "https://example.com/demo-{version}.dmg"
    /// app = "Demo.app"
    /// "#)?;
    /// let cache = DownloadCache::new("/cache");
    /// assert_eq!(
    ///     cache.path_for(&manifest, ContainerKind::Dmg).as_str(),
    ///     "/cache/downloads/demo--1.2.0.dmg"
    /// );
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn path_for(&self, manifest: &PackageManifest, kind: ContainerKind) -> Utf8PathBuf {
        self.downloads_dir().join(format!(
            "{}--{}{}",
            manifest.token(),
            manifest.version(),
            kind.extension()
        ))
    }

    /// Directory holding downloaded artifacts.
    #[must_use]
    pub fn downloads_dir(&self) -> Utf8PathBuf {
        self.root.join("downloads")
    }

    /// Returns a local copy of the artifact at `url`.
    ///
    /// A cached file is reused only if it matches the manifest digest;
    /// otherwise it is deleted and downloaded again. Fresh downloads still
    /// need [`DownloadCache::verify`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::InstallerError::Download`] when the fetch
    /// fails.
    pub fn fetch(
        &self,
        downloader: &dyn ArtefactDownloader,
        manifest: &PackageManifest,
        url: &str,
    ) -> Result<CachedArtifact> {
        let kind = Self::container_kind(url)?;
        let path = self.path_for(manifest, kind);

        if path.is_file() {
            match check_file(path.as_std_path(), manifest.sha256())? {
                Verification::Match => {
                    log::info!("using cached download {path}");
                    return Ok(CachedArtifact {
                        path,
                        kind,
                        reused: true,
                    });
                }
                Verification::Mismatch { actual } => {
                    log::debug!("discarding stale download {path} ({actual})");
                    std::fs::remove_file(&path)?;
                }
            }
        }

        create_parent(&path)?;
        downloader.download_to(url, path.as_std_path())?;
        Ok(CachedArtifact {
            path,
            kind,
            reused: false,
        })
    }

    /// Checks a fetched artifact against the manifest digest.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::InstallerError::ChecksumMismatch`] when the
    /// bytes differ; the file is deleted first.
    pub fn verify(artifact: &CachedArtifact, manifest: &PackageManifest, url: &str) -> Result<()> {
        if artifact.reused {
            return Ok(());
        }
        verify_or_discard(artifact.path.as_std_path(), manifest.sha256(), url)
    }
}

fn create_parent(path: &Utf8Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) => std::fs::create_dir_all(parent),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artefact::download::MockArtefactDownloader;
    use crate::error::InstallerError;
    use crate::test_utils::ManifestBuilder;

    fn cache_in(temp: &tempfile::TempDir) -> DownloadCache {
        DownloadCache::new(Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8"))
    }

    #[test]
    fn downloads_into_cache() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache = cache_in(&temp);
        let manifest = ManifestBuilder::new("demo").payload(b"bundle").build();
        let url = manifest.download_url().expect("url");
        let expected_url = url.clone();

        let mut downloader = MockArtefactDownloader::new();
        downloader
            .expect_download_to()
            .withf(move |requested, _| requested == expected_url)
            .times(1)
            .returning(|_, dest| {
                std::fs::write(dest, b"bundle")?;
                Ok(())
            });

        let artifact = cache.fetch(&downloader, &manifest, &url).expect("fetch");
        DownloadCache::verify(&artifact, &manifest, &url).expect("verified");
        assert!(!artifact.reused);
        assert!(artifact.path.as_str().ends_with("downloads/demo--1.0.0.zip"));
    }

    #[test]
    fn reuses_matching_cached_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache = cache_in(&temp);
        let manifest = ManifestBuilder::new("demo").payload(b"bundle").build();
        let url = manifest.download_url().expect("url");
        let path = cache.path_for(&manifest, ContainerKind::Zip);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, b"bundle").expect("seed cache");

        let mut downloader = MockArtefactDownloader::new();
        downloader.expect_download_to().times(0);

        let artifact = cache.fetch(&downloader, &manifest, &url).expect("fetch");
        assert!(artifact.reused);
    }

    #[test]
    fn stale_cached_file_is_replaced() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache = cache_in(&temp);
        let manifest = ManifestBuilder::new("demo").payload(b"bundle").build();
        let url = manifest.download_url().expect("url");
        let path = cache.path_for(&manifest, ContainerKind::Zip);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, b"truncated").expect("seed cache");

        let mut downloader = MockArtefactDownloader::new();
        downloader
            .expect_download_to()
            .times(1)
            .returning(|_, dest| {
                std::fs::write(dest, b"bundle")?;
                Ok(())
            });

        let artifact = cache.fetch(&downloader, &manifest, &url).expect("fetch");
        assert!(!artifact.reused);
        assert_eq!(std::fs::read(&artifact.path).expect("read"), b"bundle");
    }

    #[test]
    fn corrupted_download_is_deleted() {
        let temp = tempfile::tempdir().expect("temp dir");
        let cache = cache_in(&temp);
        let manifest = ManifestBuilder::new("demo").payload(b"bundle").build();
        let url = manifest.download_url().expect("url");

        let mut downloader = MockArtefactDownloader::new();
        downloader.expect_download_to().returning(|_, dest| {
            std::fs::write(dest, b"bundlf")?;
            Ok(())
        });

        let artifact = cache.fetch(&downloader, &manifest, &url).expect("fetch");
        let err = DownloadCache::verify(&artifact, &manifest, &url).expect_err("mismatch");
        assert!(matches!(err, InstallerError::ChecksumMismatch { .. }));
        assert!(!cache.path_for(&manifest, ContainerKind::Zip).exists());
    }

    #[test]
    fn unknown_container_fails_before_download() {
        let err = DownloadCache::container_kind("https://example.com/app.pkg")
            .expect_err("unsupported");
        assert!(err.to_string().contains("app.pkg"));
    }
}
