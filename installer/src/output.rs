//! Output formatting for the installer CLI.
//!
//! Progress and warnings go to stderr; results meant for scripts (`list`,
//! `livecheck`, `info`) go to stdout. Every writer is passed in so that
//! tests can capture output in a `Vec<u8>`.

use crate::error::Warning;
use std::fmt::Display;
use std::io::Write;

/// Write one line, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a progress heading (`==> message`).
///
/// # Examples
///
/// ```
/// use casket::output::heading;
///
/// assert_eq!(heading("Downloading FreeTube"), "==> Downloading FreeTube");
/// ```
#[must_use]
pub fn heading(message: impl Display) -> String {
    format!("==> {message}")
}

/// Write a progress heading unless `quiet` is set.
pub fn write_heading(stderr: &mut dyn Write, quiet: bool, message: impl Display) {
    if !quiet {
        write_stderr_line(stderr, heading(message));
    }
}

/// Write every warning. Warnings are shown even in quiet mode.
pub fn write_warnings(stderr: &mut dyn Write, warnings: &[Warning]) {
    for warning in warnings {
        write_stderr_line(stderr, format!("Warning: {warning}"));
    }
}

/// Format the caveats block shown after install.
#[must_use]
pub fn caveats_block(text: &str) -> String {
    format!("{}\n{text}", heading("Caveats"))
}

/// Format the closing message for a completed action.
///
/// # Examples
///
/// ```
/// use casket::output::success_message;
///
/// assert_eq!(
///     success_message("freetube", "0.23.3", "installed"),
///     "freetube 0.23.3 was successfully installed!"
/// );
/// ```
#[must_use]
pub fn success_message(token: &str, version: &str, verb: &str) -> String {
    format!("{token} {version} was successfully {verb}!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn warnings_are_prefixed() {
        let mut stderr = Vec::new();
        write_warnings(
            &mut stderr,
            &[Warning::PathNotFound {
                path: Utf8PathBuf::from("/Applications/FreeTube.app"),
            }],
        );
        let text = String::from_utf8(stderr).expect("stderr UTF-8");
        assert_eq!(
            text,
            "Warning: /Applications/FreeTube.app was not found; skipping\n"
        );
    }

    #[test]
    fn quiet_suppresses_headings() {
        let mut stderr = Vec::new();
        write_heading(&mut stderr, true, "Downloading");
        assert!(stderr.is_empty());
    }

    #[test]
    fn caveats_block_has_heading() {
        let block = caveats_block("Gatekeeper is disabled");
        assert!(block.starts_with("==> Caveats\n"));
        assert!(block.ends_with("Gatekeeper is disabled"));
    }
}
