//! Shared test utilities for the casket crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! behaviour tests under `tests/`.

use crate::artefact::download::{ArtefactDownloader, DownloadError};
use crate::error::{InstallerError, Result};
use crate::exec::CommandExecutor;
use crate::manifest::checksum::Sha256Digest;
use crate::manifest::{PackageManifest, parse_manifest};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::path::Path;
use std::process::{ExitStatus, Output};

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
pub fn success_output() -> Output {
    stdout_output("")
}

/// Creates a successful command `Output` with the given stdout.
pub fn stdout_output(stdout: &str) -> Output {
    Output {
        status: exit_status(0),
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "hdiutil").
    pub cmd: &'static str,
    /// The arguments to expect, or `None` to accept any.
    pub args: Option<Vec<String>>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expects `cmd` with exactly `args`.
    pub fn new(cmd: &'static str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd,
            args: Some(args.iter().map(|arg| (*arg).to_owned()).collect()),
            result,
        }
    }

    /// Expects `cmd` with any arguments.
    pub fn any(cmd: &'static str, result: Result<Output>) -> Self {
        Self {
            cmd,
            args: None,
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let mut expected = self.expected.borrow_mut();
        let call = expected.pop_front().ok_or_else(|| InstallerError::StubMismatch {
            message: format!("unexpected command invocation: {cmd} {args:?}"),
        })?;

        if call.cmd != cmd {
            return Err(InstallerError::StubMismatch {
                message: format!("expected command {}, got {cmd}", call.cmd),
            });
        }
        if let Some(expected_args) = &call.args {
            if expected_args.as_slice() != args {
                return Err(InstallerError::StubMismatch {
                    message: format!("expected args {expected_args:?} for {cmd}, got {args:?}"),
                });
            }
        }

        call.result
    }
}

/// Executor that succeeds for every command and records what it ran.
///
/// Commands registered with [`RecordingExecutor::failing`] exit with
/// status 1 instead.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    failing: Vec<String>,
    stdout: HashMap<String, String>,
    calls: RefCell<Vec<Vec<String>>>,
}

impl RecordingExecutor {
    /// Creates an executor where every command succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `cmd` exit with status 1.
    #[must_use]
    pub fn failing(mut self, cmd: &str) -> Self {
        self.failing.push(cmd.to_owned());
        self
    }

    /// Makes `cmd` print `stdout`.
    #[must_use]
    pub fn printing(mut self, cmd: &str, stdout: &str) -> Self {
        self.stdout.insert(cmd.to_owned(), stdout.to_owned());
        self
    }

    /// Every invocation so far, program first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Invocations of `cmd`, arguments only.
    pub fn calls_to(&self, cmd: &str) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|call| call.first().is_some_and(|program| program == cmd))
            .map(|call| call.iter().skip(1).cloned().collect())
            .collect()
    }
}

impl CommandExecutor for RecordingExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        let mut call = vec![cmd.to_owned()];
        call.extend(args.iter().map(|arg| (*arg).to_owned()));
        self.calls.borrow_mut().push(call);

        if self.failing.iter().any(|failing| failing == cmd) {
            return Ok(failure_output("command failed"));
        }
        Ok(stdout_output(
            self.stdout.get(cmd).map_or("", String::as_str),
        ))
    }
}

/// In-memory downloader serving registered URLs and counting requests.
#[derive(Debug, Default)]
pub struct FakeDownloader {
    artifacts: HashMap<String, Vec<u8>>,
    pages: HashMap<String, String>,
    calls: RefCell<Vec<String>>,
}

impl FakeDownloader {
    /// Creates a downloader that knows no URLs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `bytes` at `url` for [`ArtefactDownloader::download_to`].
    #[must_use]
    pub fn with_artifact(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.artifacts.insert(url.to_owned(), bytes);
        self
    }

    /// Serves `body` at `url` for [`ArtefactDownloader::fetch_text`].
    #[must_use]
    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_owned(), body.to_owned());
        self
    }

    /// Every URL requested so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Number of requests made so far.
    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ArtefactDownloader for FakeDownloader {
    fn download_to(&self, url: &str, dest: &Path) -> std::result::Result<(), DownloadError> {
        self.calls.borrow_mut().push(url.to_owned());
        let bytes = self.artifacts.get(url).ok_or_else(|| DownloadError::NotFound {
            url: url.to_owned(),
        })?;
        std::fs::write(dest, bytes)?;
        Ok(())
    }

    fn fetch_text(&self, url: &str) -> std::result::Result<String, DownloadError> {
        self.calls.borrow_mut().push(url.to_owned());
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| DownloadError::NotFound {
                url: url.to_owned(),
            })
    }
}

/// Builds a zip archive holding a minimal bundle for each name in `apps`.
///
/// # Panics
///
/// Panics if the archive cannot be written.
pub fn zip_bundles(apps: &[&str]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for app in apps {
        writer
            .start_file(format!("{app}/Contents/Info.plist"), options)
            .expect("start plist");
        writer
            .write_all(format!("<plist>{app}</plist>").as_bytes())
            .expect("write plist");
        writer
            .start_file(format!("{app}/Contents/MacOS/main"), options)
            .expect("start binary");
        writer.write_all(b"#!/bin/sh\n").expect("write binary");
    }
    writer.finish().expect("finish zip").into_inner()
}

/// Returns the hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256Digest::of_bytes(bytes).to_string()
}

/// Builder for manifest TOML used across tests.
///
/// Defaults to version `1.0.0`, a zip download at
/// `https://example.com/<token>-<version>.zip` and a single `Demo.app`.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    token: String,
    version: String,
    url: String,
    sha256: String,
    app: String,
    top_level: Vec<String>,
    tables: Vec<String>,
}

impl ManifestBuilder {
    /// Starts a manifest for `token`.
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_owned(),
            version: "1.0.0".to_owned(),
            url: "https://example.com/{token}-{version}.zip".to_owned(),
            sha256: sha256_hex(b""),
            app: "\"Demo.app\"".to_owned(),
            top_level: Vec::new(),
            tables: Vec::new(),
        }
    }

    /// Sets the version.
    #[must_use]
    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_owned();
        self
    }

    /// Sets the URL template.
    #[must_use]
    pub fn url(mut self, url: &str) -> Self {
        self.url = url.to_owned();
        self
    }

    /// Sets the checksum to the digest of `bytes`.
    #[must_use]
    pub fn payload(mut self, bytes: &[u8]) -> Self {
        self.sha256 = sha256_hex(bytes);
        self
    }

    /// Sets the `app` value as raw TOML, e.g. `["A.app", "B.app"]`.
    #[must_use]
    pub fn app(mut self, toml_value: &str) -> Self {
        self.app = toml_value.to_owned();
        self
    }

    /// Adds a raw top-level `key = value` line.
    #[must_use]
    pub fn line(mut self, line: &str) -> Self {
        self.top_level.push(line.to_owned());
        self
    }

    /// Declares a conflicting package.
    #[must_use]
    pub fn conflicts_with(self, token: &str) -> Self {
        self.line(&format!("conflicts_with = \"{token}\""))
    }

    /// Sets the caveats text.
    #[must_use]
    pub fn caveats(self, text: &str) -> Self {
        self.line(&format!("caveats = '''\n{text}'''"))
    }

    /// Adds a `[depends_on]` table with the given body.
    #[must_use]
    pub fn depends_on(self, body: &str) -> Self {
        self.table("depends_on", body)
    }

    /// Adds a `[postflight]` table with the given body.
    #[must_use]
    pub fn postflight(self, body: &str) -> Self {
        self.table("postflight", body)
    }

    /// Adds an `[uninstall]` table with the given body.
    #[must_use]
    pub fn uninstall(self, body: &str) -> Self {
        self.table("uninstall", body)
    }

    /// Adds a `[zap]` table with the given body.
    #[must_use]
    pub fn zap(self, body: &str) -> Self {
        self.table("zap", body)
    }

    /// Adds a `[livecheck]` table with the given body.
    #[must_use]
    pub fn livecheck(self, body: &str) -> Self {
        self.table("livecheck", body)
    }

    /// Adds an arbitrary table.
    #[must_use]
    pub fn table(mut self, name: &str, body: &str) -> Self {
        self.tables.push(format!("[{name}]\n{body}"));
        self
    }

    /// Renders the manifest as TOML.
    pub fn toml(&self) -> String {
        let mut text = format!(
            "token = \"{}\"\nversion = \"{}\"\nsha256 = \"{}\"\nurl = \"{}\"\napp = {}\n",
            self.token, self.version, self.sha256, self.url, self.app
        );
        for line in &self.top_level {
            text.push_str(line);
            text.push('\n');
        }
        for table in &self.tables {
            text.push('\n');
            text.push_str(table);
            text.push('\n');
        }
        text
    }

    /// Parses the rendered manifest.
    ///
    /// # Panics
    ///
    /// Panics if the manifest is invalid.
    pub fn build(&self) -> PackageManifest {
        parse_manifest(&self.toml()).expect("test manifest should parse")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_reports_unexpected_command() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "hdiutil",
            &["detach", "/mnt"],
            Ok(success_output()),
        )]);
        let err = executor
            .run("hdiutil", &["attach", "/mnt"])
            .expect_err("arguments differ");
        assert!(matches!(err, InstallerError::StubMismatch { .. }));
        executor.assert_finished();
    }

    #[test]
    fn recording_executor_fails_registered_commands() {
        let executor = RecordingExecutor::new().failing("/usr/bin/xattr");
        let output = executor.run("/usr/bin/xattr", &["-d"]).expect("runs");
        assert!(!output.status.success());
        assert_eq!(executor.calls_to("/usr/bin/xattr"), vec![vec!["-d".to_owned()]]);
    }
}
