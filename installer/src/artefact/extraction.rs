//! Container detection and unpacking.
//!
//! Supports disk images (mounted read-only with `hdiutil`), zip archives,
//! and gzip- or zstd-compressed tarballs. Tar entries are checked for path
//! traversal before anything is written.

use crate::exec::{CommandExecutor, failure_reason};
use crate::stager::copy_tree;
use std::fmt;
use std::io::Read;
use std::path::{Component, Path};

/// Container formats casket can unpack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Apple disk image.
    Dmg,
    /// Zip archive.
    Zip,
    /// Gzip-compressed tarball.
    TarGz,
    /// Zstandard-compressed tarball.
    TarZst,
}

impl ContainerKind {
    /// Detects the container format from a file name.
    ///
    /// # Examples
    ///
    /// ```
    /// use casket::artefact::extraction::ContainerKind;
    ///
    /// assert_eq!(
    ///     ContainerKind::from_file_name("freetube-0.23.3-mac-arm64.dmg"),
    ///     Some(ContainerKind::Dmg)
    /// );
    /// assert_eq!(ContainerKind::from_file_name("app.tgz"), Some(ContainerKind::TarGz));
    /// assert_eq!(ContainerKind::from_file_name("app.pkg"), None);
    /// ```
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".dmg") {
            Some(Self::Dmg)
        } else if lower.ends_with(".zip") {
            Some(Self::Zip)
        } else if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Self::TarGz)
        } else if lower.ends_with(".tar.zst") {
            Some(Self::TarZst)
        } else {
            None
        }
    }

    /// File extension used for cached downloads, including the leading dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Dmg => ".dmg",
            Self::Zip => ".zip",
            Self::TarGz => ".tar.gz",
            Self::TarZst => ".tar.zst",
        }
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension().trim_start_matches('.'))
    }
}

/// Trait for unpacking containers, enabling test mocking.
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactExtractor {
    /// Unpack the container at `archive_path` into `dest_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::PathTraversal`] if any entry attempts to
    /// escape the destination directory, [`ExtractionError::EmptyArchive`]
    /// if nothing was unpacked, and other variants on I/O or mount failures.
    fn extract(
        &self,
        archive_path: &Path,
        kind: ContainerKind,
        dest_dir: &Path,
    ) -> Result<(), ExtractionError>;
}

/// Errors arising from container extraction.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// I/O error during extraction.
    #[error("extraction I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A path in the archive attempts to traverse outside the destination.
    #[error("path traversal detected: {path}")]
    PathTraversal {
        /// The offending path from the archive entry.
        path: String,
    },

    /// The container holds nothing.
    #[error("downloaded container is empty")]
    EmptyArchive,

    /// The download's file name does not name a known container format.
    #[error("unsupported container format: {name}")]
    UnsupportedContainer {
        /// The file name that was inspected.
        name: String,
    },

    /// The zip archive is malformed.
    #[error("invalid zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Attaching the disk image failed.
    #[error("could not mount disk image: {reason}")]
    Mount {
        /// Description of the failure.
        reason: String,
    },
}

/// Default extractor; disk images are mounted through `executor`.
pub struct ContainerExtractor<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> ContainerExtractor<'a> {
    /// Creates an extractor that runs `hdiutil` through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }

    fn extract_dmg(&self, image: &Path, dest_dir: &Path) -> Result<(), ExtractionError> {
        let mount_dir = tempfile::Builder::new().prefix("casket-mount").tempdir()?;
        let mount_point = path_arg(mount_dir.path())?;
        let image_arg = path_arg(image)?;

        let output = self
            .executor
            .run(
                "hdiutil",
                &[
                    "attach",
                    "-nobrowse",
                    "-readonly",
                    "-noautoopen",
                    "-mountpoint",
                    mount_point,
                    image_arg,
                ],
            )
            .map_err(|err| ExtractionError::Mount {
                reason: err.to_string(),
            })?;
        if !output.status.success() {
            return Err(ExtractionError::Mount {
                reason: failure_reason(&output),
            });
        }

        let copied = copy_tree(mount_dir.path(), dest_dir);
        self.detach(mount_point);
        copied?;
        ensure_not_empty(dest_dir)
    }

    fn detach(&self, mount_point: &str) {
        let detached = self
            .executor
            .run("hdiutil", &["detach", mount_point])
            .is_ok_and(|output| output.status.success());
        if !detached {
            log::warn!("hdiutil detach {mount_point} failed; forcing");
            let forced = self
                .executor
                .run("hdiutil", &["detach", "-force", mount_point])
                .is_ok_and(|output| output.status.success());
            if !forced {
                log::warn!("hdiutil detach -force {mount_point} failed; volume left mounted");
            }
        }
    }
}

impl ArtefactExtractor for ContainerExtractor<'_> {
    fn extract(
        &self,
        archive_path: &Path,
        kind: ContainerKind,
        dest_dir: &Path,
    ) -> Result<(), ExtractionError> {
        log::debug!("extracting {} ({kind})", archive_path.display());
        std::fs::create_dir_all(dest_dir)?;
        match kind {
            ContainerKind::Dmg => self.extract_dmg(archive_path, dest_dir),
            ContainerKind::Zip => extract_zip(archive_path, dest_dir),
            ContainerKind::TarGz => {
                let file = std::fs::File::open(archive_path)?;
                unpack_tar(flate2::read::GzDecoder::new(file), dest_dir)
            }
            ContainerKind::TarZst => {
                let file = std::fs::File::open(archive_path)?;
                unpack_tar(zstd::Decoder::new(file)?, dest_dir)
            }
        }
    }
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractionError> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    if archive.is_empty() {
        return Err(ExtractionError::EmptyArchive);
    }
    for index in 0..archive.len() {
        let entry = archive.by_index(index)?;
        if entry.enclosed_name().is_none() {
            return Err(ExtractionError::PathTraversal {
                path: entry.name().to_owned(),
            });
        }
    }
    archive.extract(dest_dir)?;
    Ok(())
}

fn unpack_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<(), ExtractionError> {
    let mut archive = tar::Archive::new(reader);
    let mut unpacked = 0_usize;

    for entry_result in archive.entries()? {
        let mut entry = entry_result?;
        let entry_path = entry.path()?.into_owned();

        validate_entry_path(&entry_path)?;

        let dest_path = dest_dir.join(&entry_path);
        if let Some(parent) = dest_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        entry.unpack(&dest_path)?;
        unpacked += 1;
    }

    if unpacked == 0 {
        return Err(ExtractionError::EmptyArchive);
    }
    Ok(())
}

fn ensure_not_empty(dir: &Path) -> Result<(), ExtractionError> {
    if std::fs::read_dir(dir)?.next().is_none() {
        return Err(ExtractionError::EmptyArchive);
    }
    Ok(())
}

fn path_arg(path: &Path) -> Result<&str, ExtractionError> {
    path.to_str().ok_or_else(|| ExtractionError::Mount {
        reason: format!("{} is not valid UTF-8", path.display()),
    })
}

/// Validate that an entry path does not escape the destination
/// directory via `..` components or absolute paths.
fn validate_entry_path(path: &Path) -> Result<(), ExtractionError> {
    if path.is_absolute() {
        return Err(ExtractionError::PathTraversal {
            path: path.display().to_string(),
        });
    }
    for component in path.components() {
        if matches!(component, Component::ParentDir) {
            return Err(ExtractionError::PathTraversal {
                path: path.display().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "extraction_tests.rs"]
mod tests;
