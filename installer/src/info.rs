//! Human-readable summary of a manifest.

use std::fmt::Write as _;

use crate::error::Result;
use crate::manifest::PackageManifest;
use crate::output::heading;
use crate::receipts::Receipt;

/// Describes `manifest` for the `info` command.
///
/// `installed` is the receipt for the manifest's token, if any.
///
/// # Errors
///
/// Returns an error if the download URL cannot be resolved.
pub fn format_info(manifest: &PackageManifest, installed: Option<&Receipt>) -> Result<String> {
    let mut out = String::new();
    push_line(&mut out, heading(format!("{}: {}", manifest.token(), manifest.version())));
    if !manifest.names().is_empty() {
        push_line(&mut out, manifest.names().join(", "));
    }
    if let Some(homepage) = manifest.homepage() {
        push_line(&mut out, homepage);
    }
    if let Some(description) = manifest.description() {
        push_line(&mut out, description);
    }
    match installed {
        Some(receipt) => push_line(&mut out, format!("Installed: {}", receipt.version)),
        None => push_line(&mut out, "Not installed"),
    }
    push_line(&mut out, format!("From: {}", manifest.download_url()?));

    let depends_on = manifest.depends_on();
    if !depends_on.is_empty() {
        push_line(&mut out, heading("Requirements"));
        if !depends_on.arch().is_empty() {
            let arches: Vec<String> = depends_on.arch().iter().map(ToString::to_string).collect();
            push_line(&mut out, format!("arch: {}", arches.join(", ")));
        }
        if let Some(macos) = depends_on.macos() {
            push_line(&mut out, macos);
        }
    }

    if !manifest.conflicts_with().is_empty() {
        push_line(&mut out, heading("Conflicts"));
        for token in manifest.conflicts_with() {
            push_line(&mut out, token);
        }
    }

    push_line(&mut out, heading("Artifacts"));
    for app in manifest.apps() {
        push_line(&mut out, format!("{app} (App)"));
    }
    if let Some(command) = manifest.postflight() {
        push_line(&mut out, format!("{command} (Postflight)"));
    }

    if let Some(caveats) = manifest.rendered_caveats() {
        push_line(&mut out, heading("Caveats"));
        push_line(&mut out, caveats);
    }

    Ok(out.trim_end().to_owned())
}

fn push_line(out: &mut String, line: impl std::fmt::Display) {
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{line}");
}
