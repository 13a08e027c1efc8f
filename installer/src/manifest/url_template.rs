//! Download URL template.
//!
//! The URL is stored unresolved and resolved at fetch time, so bumping a
//! manifest only means editing `version` and `sha256` together.

use super::error::{ManifestError, Result};
use super::template::{self, TemplateVars};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholders a download URL may use.
pub const URL_PLACEHOLDERS: &[&str] = &[
    "version",
    "version.major",
    "version.minor",
    "version.patch",
    "token",
];

/// A validated `http(s)` URL template such as
/// `https://example.com/app-{version}.dmg`.
///
/// # Examples
///
/// ```
/// use casket::manifest::template::TemplateVars;
/// use casket::manifest::url_template::UrlTemplate;
///
/// let template = UrlTemplate::try_from("https://example.com/app-{version}.dmg")
///     .expect("valid template");
/// let vars = TemplateVars {
///     version: Some("0.23.3".to_owned()),
///     ..TemplateVars::default()
/// };
/// assert_eq!(
///     template.resolve(&vars).expect("resolves"),
///     "https://example.com/app-0.23.3.dmg"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlTemplate(String);

impl UrlTemplate {
    /// Return the unresolved template.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitute placeholders to produce a fetchable URL.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::InvalidTemplate`] if `vars` lacks a value the
    /// template needs.
    pub fn resolve(&self, vars: &TemplateVars) -> Result<String> {
        template::expand(&self.0, vars)
    }
}

impl TryFrom<&str> for UrlTemplate {
    type Error = ManifestError;

    fn try_from(value: &str) -> Result<Self> {
        Self::try_from(value.to_owned())
    }
}

impl TryFrom<String> for UrlTemplate {
    type Error = ManifestError;

    fn try_from(value: String) -> Result<Self> {
        if !(value.starts_with("https://") || value.starts_with("http://")) {
            return Err(ManifestError::InvalidTemplate {
                value,
                reason: "URL must use http or https".to_owned(),
            });
        }
        template::validate(&value, URL_PLACEHOLDERS)?;
        Ok(Self(value))
    }
}

impl From<UrlTemplate> for String {
    fn from(template: UrlTemplate) -> Self {
        template.0
    }
}

impl fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Return the final path component of a resolved URL, ignoring any query or
/// fragment.
///
/// # Examples
///
/// ```
/// use casket::manifest::url_template::url_file_name;
///
/// assert_eq!(
///     url_file_name("https://example.com/dl/app-1.0.dmg?raw=1"),
///     Some("app-1.0.dmg")
/// );
/// assert_eq!(url_file_name("https://example.com/"), None);
/// ```
#[must_use]
pub fn url_file_name(url: &str) -> Option<&str> {
    let without_fragment = url.split('#').next().unwrap_or(url);
    let without_query = without_fragment.split('?').next().unwrap_or(without_fragment);
    let (_, path) = without_query.split_once("://")?;
    let (_, path) = path.split_once('/')?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
