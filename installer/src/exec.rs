//! External command execution.
//!
//! All programs casket runs (`sw_vers`, `hdiutil`, `osascript` and the
//! manifest's post-install command) go through [`CommandExecutor`] so tests
//! can substitute a stub and assert on the exact invocations.

use crate::error::{InstallerError, Result};
use std::io::{self, Read};
use std::process::{Command, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Default time limit for external commands (2 minutes).
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(120);

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the
    /// command, or [`InstallerError::CommandTimedOut`] when it overruns.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use casket::exec::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor::default();
    /// let output = executor.run("/usr/bin/sw_vers", &["-productVersion"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), casket::error::InstallerError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system, killing any that overrun.
#[derive(Debug, Clone, Copy)]
pub struct SystemCommandExecutor {
    timeout: Duration,
}

impl SystemCommandExecutor {
    /// Creates an executor with the given time limit.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the configured time limit.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for SystemCommandExecutor {
    fn default() -> Self {
        Self::with_timeout(DEFAULT_COMMAND_TIMEOUT)
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        log::debug!("running {cmd} {args:?}");
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // The pipes are drained while waiting so a chatty child cannot fill
        // the pipe buffer and stall until the timeout fires.
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        match child.wait_timeout(self.timeout)? {
            Some(status) => Ok(Output {
                status,
                stdout: collect(stdout)?,
                stderr: collect(stderr)?,
            }),
            None => {
                if let Err(e) = child.kill() {
                    log::warn!("failed to kill {cmd}: {e}");
                }
                if let Err(e) = child.wait() {
                    log::warn!("failed to reap {cmd}: {e}");
                }
                // Grandchildren may still hold the pipes open, so the readers
                // are detached rather than joined.
                drop((stdout, stderr));
                Err(InstallerError::CommandTimedOut {
                    command: cmd.to_owned(),
                    seconds: self.timeout.as_secs(),
                })
            }
        }
    }
}

type Reader = Option<JoinHandle<io::Result<Vec<u8>>>>;

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Reader {
    pipe.map(|mut source| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            source.read_to_end(&mut buf)?;
            Ok(buf)
        })
    })
}

fn collect(reader: Reader) -> Result<Vec<u8>> {
    let Some(handle) = reader else {
        return Ok(Vec::new());
    };
    match handle.join() {
        Ok(bytes) => Ok(bytes?),
        Err(_) => Err(InstallerError::Io(io::Error::other(
            "output reader thread panicked",
        ))),
    }
}

/// Describes a finished command for warnings and errors.
///
/// Prefers the trimmed stderr text; falls back to the exit status.
#[must_use]
pub fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if stderr.is_empty() {
        output.status.to_string()
    } else {
        format!("{} ({stderr})", output.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{failure_output, success_output};

    #[test]
    fn default_timeout_is_two_minutes() {
        assert_eq!(
            SystemCommandExecutor::default().timeout(),
            Duration::from_secs(120)
        );
    }

    #[test]
    fn failure_reason_includes_stderr() {
        let reason = failure_reason(&failure_output("No such xattr"));
        assert!(reason.contains("No such xattr"));
    }

    #[test]
    fn failure_reason_falls_back_to_status() {
        let reason = failure_reason(&success_output());
        assert!(!reason.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn runs_real_command() {
        let executor = SystemCommandExecutor::default();
        let output = executor.run("echo", &["hello"]).expect("echo runs");
        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[cfg(unix)]
    #[test]
    fn output_larger_than_pipe_buffer_is_captured() {
        let executor = SystemCommandExecutor::with_timeout(Duration::from_secs(3));
        let output = executor
            .run("sh", &["-c", "head -c 200000 /dev/zero"])
            .expect("large output should not stall the child");
        assert!(output.status.success());
        assert_eq!(output.stdout.len(), 200_000);
    }

    #[cfg(unix)]
    #[test]
    fn overrunning_command_is_killed() {
        let executor = SystemCommandExecutor::with_timeout(Duration::from_millis(100));
        let err = executor.run("sleep", &["5"]).expect_err("should time out");
        assert!(matches!(err, InstallerError::CommandTimedOut { .. }));
    }
}
