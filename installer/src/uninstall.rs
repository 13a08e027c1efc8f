//! Quitting running applications before their bundles are removed.
//!
//! Applications are addressed by bundle identifier through `osascript`.
//! Quitting is best effort: an application that is not running, or whose
//! state cannot be queried, is skipped.

use crate::error::Warning;
use crate::exec::{CommandExecutor, failure_reason};
use crate::manifest::uninstall_rule::BundleId;
use std::time::Duration;

/// Sends quit requests and waits for applications to exit.
pub struct Quitter<'a> {
    executor: &'a dyn CommandExecutor,
    poll_interval: Duration,
    attempts: u32,
}

impl<'a> Quitter<'a> {
    /// Creates a quitter that waits up to ten seconds per application.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self {
            executor,
            poll_interval: Duration::from_millis(500),
            attempts: 20,
        }
    }

    /// Overrides how long to wait for an application to exit.
    #[must_use]
    pub const fn with_polling(mut self, poll_interval: Duration, attempts: u32) -> Self {
        self.poll_interval = poll_interval;
        self.attempts = attempts;
        self
    }

    /// Whether an application with `bundle_id` is running.
    ///
    /// Query failures count as not running.
    #[must_use]
    pub fn is_running(&self, bundle_id: &BundleId) -> bool {
        let script = format!("application id \"{bundle_id}\" is running");
        match self.executor.run("osascript", &["-e", &script]) {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim() == "true"
            }
            Ok(output) => {
                log::debug!("could not query {bundle_id}: {}", failure_reason(&output));
                false
            }
            Err(e) => {
                log::debug!("could not query {bundle_id}: {e}");
                false
            }
        }
    }

    /// Asks the application to quit if it is running.
    ///
    /// Returns a [`Warning::QuitFailed`] when the request fails or the
    /// application is still running once the wait is over.
    #[must_use]
    pub fn quit(&self, bundle_id: &BundleId) -> Option<Warning> {
        if !self.is_running(bundle_id) {
            log::debug!("{bundle_id} is not running");
            return None;
        }

        let script = format!("tell application id \"{bundle_id}\" to quit");
        let failed = |reason: String| {
            Some(Warning::QuitFailed {
                bundle_id: bundle_id.to_string(),
                reason,
            })
        };
        match self.executor.run("osascript", &["-e", &script]) {
            Ok(output) if output.status.success() => {}
            Ok(output) => return failed(failure_reason(&output)),
            Err(e) => return failed(e.to_string()),
        }

        for _ in 0..self.attempts {
            if !self.is_running(bundle_id) {
                return None;
            }
            std::thread::sleep(self.poll_interval);
        }
        failed("application is still running".to_owned())
    }
}
