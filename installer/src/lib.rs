//! casket library.
//!
//! This crate interprets declarative package manifests for macOS application
//! bundles. It downloads and verifies an artifact, unpacks it, copies the
//! bundles into the applications directory, and later removes them again,
//! optionally together with the user data listed for zapping. It is used by
//! the `casket` CLI binary and can be consumed programmatically for testing.
//!
//! # Modules
//!
//! - [`artefact`] - Download, cache, checksum verification and unpacking
//! - [`cli`] - Command-line argument definitions
//! - [`commands`] - Handlers for each subcommand
//! - [`config`] - Settings from flags, environment and `config.toml`
//! - [`context`] - Locations and host facts for an action
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`error`] - Fatal error and warning types
//! - [`exec`] - External command execution with timeouts
//! - [`info`] - Manifest summaries for the `info` command
//! - [`interpreter`] - Install, uninstall, zap and livecheck execution
//! - [`list`] - The `list` command
//! - [`list_output`] - Output formatting for installed packages
//! - [`livecheck`] - Upstream version detection
//! - [`lock`] - Per-package advisory locks
//! - [`manifest`] - Manifest schema, parsing and validation
//! - [`output`] - User-facing progress and message formatting
//! - [`plan`] - Ordered steps for each action
//! - [`platform`] - Host detection and `depends_on` checks
//! - [`receipts`] - Records of installed packages
//! - [`stager`] - Copying bundles into the applications directory
//! - [`uninstall`] - Quitting running applications
//! - [`zap`] - Removing user data paths

pub mod artefact;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod dirs;
pub mod error;
pub mod exec;
pub mod info;
pub mod interpreter;
pub mod list;
pub mod list_output;
pub mod livecheck;
pub mod lock;
pub mod manifest;
pub mod output;
pub mod plan;
pub mod platform;
pub mod receipts;
pub mod stager;
pub mod uninstall;
pub mod zap;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
