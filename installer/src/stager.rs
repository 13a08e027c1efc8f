//! Copying application bundles into the applications directory.
//!
//! Bundles are copied into a hidden sibling first and renamed into place,
//! so an interrupted copy never leaves a half-written bundle under the
//! target name. An existing bundle with the same name is moved aside until
//! the install is recorded, so a failed install can put it back.

use crate::error::{InstallerError, Result};
use crate::manifest::artifact::AppArtifact;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io;
use std::path::Path;

/// Handles staging of bundles into the applications directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stager {
    appdir: Utf8PathBuf,
}

impl Stager {
    /// Create a new stager targeting `appdir`.
    #[must_use]
    pub fn new(appdir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            appdir: appdir.into(),
        }
    }

    /// Ensure the applications directory exists and is writable.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or is not writable.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.appdir).map_err(|e| InstallerError::TargetNotWritable {
            path: self.appdir.clone(),
            reason: e.to_string(),
        })?;

        let test_path = self.appdir.join(".casket-write-test");
        match fs::write(&test_path, b"test") {
            Ok(()) => {
                if let Err(e) = fs::remove_file(&test_path) {
                    log::warn!("could not remove {test_path}: {e}");
                }
                Ok(())
            }
            Err(e) => Err(InstallerError::TargetNotWritable {
                path: self.appdir.clone(),
                reason: e.to_string(),
            }),
        }
    }

    /// Check that every declared bundle exists under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::ArtifactMissing`] for the first bundle that
    /// is absent.
    pub fn ensure_present(root: &Utf8Path, apps: &[AppArtifact]) -> Result<()> {
        match apps
            .iter()
            .find(|app| fs::symlink_metadata(root.join(app.source())).is_err())
        {
            Some(app) => Err(InstallerError::ArtifactMissing {
                bundle: app.source().to_path_buf(),
            }),
            None => Ok(()),
        }
    }

    /// Copy one bundle from the unpacked container into place.
    ///
    /// A bundle already at the target is moved aside rather than deleted;
    /// the returned [`Staged`] either restores it or discards it.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::StagingFailed`] if the copy or the final
    /// rename fails. The applications directory is left as it was.
    pub fn stage(&self, root: &Utf8Path, app: &AppArtifact) -> Result<Staged> {
        let source = root.join(app.source());
        let dest = self.target_path(app);
        let scratch = self.appdir.join(format!(".casket-{}.partial", app.target()));
        let aside = self.appdir.join(format!(".casket-{}.previous", app.target()));

        let copied = remove_path(scratch.as_std_path())
            .and_then(|()| copy_tree(source.as_std_path(), scratch.as_std_path()));
        if let Err(e) = copied {
            discard(&scratch);
            return Err(staging_failed(&source, &dest, &e));
        }

        let previous = match move_aside(&dest, &aside) {
            Ok(previous) => previous,
            Err(e) => {
                discard(&scratch);
                return Err(staging_failed(&source, &dest, &e));
            }
        };

        if let Err(e) = fs::rename(&scratch, &dest) {
            discard(&scratch);
            let staged = Staged {
                path: dest.clone(),
                previous,
            };
            staged.restore();
            return Err(staging_failed(&source, &dest, &e));
        }

        log::debug!("staged {source} at {dest}");
        Ok(Staged {
            path: dest,
            previous,
        })
    }

    /// Where `app` is installed.
    #[must_use]
    pub fn target_path(&self, app: &AppArtifact) -> Utf8PathBuf {
        self.appdir.join(app.target())
    }

    /// Return the applications directory.
    #[must_use]
    pub fn appdir(&self) -> &Utf8Path {
        &self.appdir
    }
}

/// A bundle copied into place, plus the bundle it displaced, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Staged {
    /// Where the new bundle now lives.
    pub path: Utf8PathBuf,
    /// Hidden copy of the bundle previously at `path`.
    pub previous: Option<Utf8PathBuf>,
}

impl Staged {
    /// Removes the new bundle and puts the displaced one back.
    ///
    /// Failures are logged; rollback continues with whatever remains.
    pub fn restore(&self) {
        if let Err(e) = remove_path(self.path.as_std_path()) {
            log::warn!("could not roll back {}: {e}", self.path);
            return;
        }
        let Some(previous) = &self.previous else {
            return;
        };
        if let Err(e) = fs::rename(previous, &self.path) {
            log::warn!("could not restore {} from {previous}: {e}", self.path);
        }
    }

    /// Deletes the displaced bundle once the install is recorded.
    pub fn commit(&self) {
        if let Some(previous) = &self.previous {
            discard(previous);
        }
    }
}

fn move_aside(dest: &Utf8Path, aside: &Utf8Path) -> io::Result<Option<Utf8PathBuf>> {
    remove_path(aside.as_std_path())?;
    match fs::rename(dest, aside) {
        Ok(()) => Ok(Some(aside.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

fn discard(path: &Utf8Path) {
    if let Err(e) = remove_path(path.as_std_path()) {
        log::warn!("could not remove {path}: {e}");
    }
}

fn staging_failed(source: &Utf8Path, dest: &Utf8Path, e: &io::Error) -> InstallerError {
    InstallerError::StagingFailed {
        reason: format!("failed to copy {source} to {dest}: {e}"),
    }
}

/// Recursively copy `src` to `dest`, recreating symlinks rather than
/// following them.
///
/// # Errors
///
/// Returns any I/O error from reading `src` or writing `dest`.
pub fn copy_tree(src: &Path, dest: &Path) -> io::Result<()> {
    let metadata = fs::symlink_metadata(src)?;
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        copy_symlink(src, dest)
    } else if file_type.is_dir() {
        fs::create_dir_all(dest)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            copy_tree(&entry.path(), &dest.join(entry.file_name()))?;
        }
        fs::set_permissions(dest, metadata.permissions())
    } else {
        fs::copy(src, dest).map(|_| ())
    }
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, dest)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest).map(|_| ())
}

/// Remove a file, symlink or directory tree. Missing paths are not an error.
///
/// # Errors
///
/// Returns any I/O error other than `NotFound`.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };
    if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(test)]
#[path = "stager_tests.rs"]
mod tests;
