//! Fetching, verifying and unpacking the artifact a manifest points at.
//!
//! # Sub-modules
//!
//! - [`cache`] - Download cache keyed by token and version.
//! - [`download`] - Downloader trait and HTTP implementation.
//! - [`extraction`] - Container detection and unpacking.
//! - [`verification`] - SHA-256 checks against the manifest digest.

pub mod cache;
pub mod download;
pub mod extraction;
pub mod verification;
