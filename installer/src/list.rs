//! List command implementation.
//!
//! This module provides the `run_list` command handler, which reads the
//! receipts under the Caskroom and prints the installed packages.

use std::io::Write;

use crate::cli::ListArgs;
use crate::error::{InstallerError, Result};
use crate::list_output::{format_human, format_json};
use crate::receipts::ReceiptStore;

/// Lists installed packages.
///
/// Output is written to stdout (human-readable by default, JSON with `--json`).
///
/// # Errors
///
/// Returns an error if the Caskroom cannot be read or writing to stdout fails.
pub fn run_list(args: &ListArgs, receipts: &ReceiptStore, stdout: &mut dyn Write) -> Result<()> {
    let installed = receipts.list()?;

    let output = if args.json {
        format_json(&installed)
    } else {
        format_human(&installed)
    };

    writeln!(stdout, "{output}").map_err(|e| InstallerError::WriteFailed { source: e })?;

    Ok(())
}
