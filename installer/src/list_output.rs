//! Output formatting for installed packages.
//!
//! This module formats receipts for human-readable or JSON output.

use serde::Serialize;

use crate::receipts::Receipt;

/// Format installed packages for human-readable output.
///
/// # Examples
///
/// ```
/// use casket::list_output::format_human;
///
/// let output = format_human(&[]);
/// assert!(output.contains("No packages installed"));
/// ```
#[must_use]
pub fn format_human(receipts: &[Receipt]) -> String {
    if receipts.is_empty() {
        return String::from("No packages installed.");
    }

    let width = receipts
        .iter()
        .map(|receipt| receipt.token.as_str().len())
        .max()
        .unwrap_or(0);
    receipts
        .iter()
        .map(|receipt| {
            format!(
                "{:<width$}  {}",
                receipt.token.as_str(),
                receipt.version.as_str()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format installed packages as JSON.
///
/// # Examples
///
/// ```
/// use casket::list_output::format_json;
///
/// let json = format_json(&[]);
/// assert!(json.contains("\"packages\""));
/// ```
#[must_use]
pub fn format_json(receipts: &[Receipt]) -> String {
    let json_data = InstalledPackagesJson {
        packages: receipts.iter().map(PackageEntry::from).collect(),
    };

    serde_json::to_string_pretty(&json_data).unwrap_or_else(|_| "{}".to_owned())
}

/// JSON-serializable list of installed packages.
#[derive(Debug, Serialize)]
pub struct InstalledPackagesJson {
    /// One entry per receipt.
    pub packages: Vec<PackageEntry>,
}

/// A single installed package.
#[derive(Debug, Serialize)]
pub struct PackageEntry {
    /// Package token.
    pub token: String,
    /// Installed version.
    pub version: String,
    /// Installed bundle paths.
    pub artifacts: Vec<String>,
    /// Seconds since the Unix epoch.
    pub installed_at: u64,
}

impl From<&Receipt> for PackageEntry {
    fn from(receipt: &Receipt) -> Self {
        Self {
            token: receipt.token.to_string(),
            version: receipt.version.to_string(),
            artifacts: receipt.artifacts.iter().map(ToString::to_string).collect(),
            installed_at: receipt.installed_at,
        }
    }
}
