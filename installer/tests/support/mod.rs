//! Test support utilities for casket behavioural tests.
//!
//! This module provides helpers shared across the behaviour test binaries:
//! workspace path resolution, isolated install contexts, and directory
//! listings for before/after comparisons.

#![allow(dead_code, reason = "each test binary uses a subset of the helpers")]

use camino::Utf8PathBuf;
use casket::context::InstallContext;
use casket::manifest::depends_on::{Arch, MacosRelease};
use casket::platform::HostPlatform;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tempfile::TempDir;

/// Returns the workspace root directory (parent of the installer crate).
pub fn workspace_root() -> PathBuf {
    PathBuf::from(std::env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("manifest dir should have parent")
        .to_owned()
}

/// Path of the reference manifest shipped with the repository.
pub fn reference_manifest() -> Utf8PathBuf {
    let path = workspace_root()
        .join("manifests")
        .join("pikachuexe-freetube.toml");
    Utf8PathBuf::try_from(path).expect("workspace path should be UTF-8")
}

/// A context rooted in `temp`, on an Apple silicon host running Sonoma.
pub fn isolated_context(temp: &TempDir) -> InstallContext {
    let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8 temp dir");
    let context = InstallContext {
        appdir: root.join("Applications"),
        home: root.join("home"),
        caskroom: root.join("Caskroom"),
        cache_dir: root.join("cache"),
        host: HostPlatform::new(Some(Arch::Arm64), Some(MacosRelease::new(14, 0))),
    };
    std::fs::create_dir_all(&context.appdir).expect("create appdir");
    std::fs::create_dir_all(&context.home).expect("create home");
    context
}

/// Names of the entries directly under `dir`; empty if it does not exist.
pub fn listing(dir: &Utf8PathBuf) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
