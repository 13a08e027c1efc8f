//! `{placeholder}` scanning and expansion.
//!
//! Templates appear in the download URL, the post-install arguments, and the
//! caveats text. URL and argument templates are strict: every placeholder
//! must be known when the manifest is parsed. Caveats are free-form prose and
//! use [`expand_lenient`], which leaves unknown braces untouched.

use super::error::{ManifestError, Result};

/// A scanned piece of a template string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text copied verbatim.
    Literal(&'a str),
    /// The name between `{` and `}`.
    Placeholder(&'a str),
}

/// Values available for substitution.
///
/// Placeholders are looked up by name; `version.major`, `version.minor`, and
/// `version.patch` are derived from `version`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars {
    /// The package token.
    pub token: Option<String>,
    /// The package version.
    pub version: Option<String>,
    /// The applications directory the bundle is installed into.
    pub appdir: Option<String>,
}

impl TemplateVars {
    /// Look up a placeholder by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<String> {
        let component = |index: usize| {
            self.version
                .as_deref()
                .and_then(|v| v.split('.').nth(index))
                .map(str::to_owned)
        };
        match name {
            "token" => self.token.clone(),
            "version" => self.version.clone(),
            "appdir" => self.appdir.clone(),
            "version.major" => component(0),
            "version.minor" => component(1),
            "version.patch" => component(2),
            _ => None,
        }
    }
}

/// Split a template into literal and placeholder segments.
///
/// # Errors
///
/// Returns [`ManifestError::InvalidTemplate`] if a `{` is never closed or a
/// placeholder name is empty.
///
/// # Examples
///
/// ```
/// use casket::manifest::template::{Segment, scan};
///
/// let segments = scan("app-{version}.dmg").expect("valid template");
/// assert_eq!(
///     segments,
///     vec![
///         Segment::Literal("app-"),
///         Segment::Placeholder("version"),
///         Segment::Literal(".dmg"),
///     ]
/// );
/// ```
pub fn scan(template: &str) -> Result<Vec<Segment<'_>>> {
    let invalid = |reason: &str| ManifestError::InvalidTemplate {
        value: template.to_owned(),
        reason: reason.to_owned(),
    };

    let mut segments = Vec::new();
    let mut rest = template;
    while let Some((before, after)) = rest.split_once('{') {
        if !before.is_empty() {
            segments.push(Segment::Literal(before));
        }
        let (name, tail) = after
            .split_once('}')
            .ok_or_else(|| invalid("unclosed '{'"))?;
        if name.trim().is_empty() {
            return Err(invalid("empty placeholder"));
        }
        segments.push(Segment::Placeholder(name.trim()));
        rest = tail;
    }
    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }
    Ok(segments)
}

/// Check that every placeholder in `template` is in `allowed`.
///
/// # Errors
///
/// Returns [`ManifestError::InvalidTemplate`] on a malformed template or an
/// unknown placeholder.
pub fn validate(template: &str, allowed: &[&str]) -> Result<()> {
    for segment in scan(template)? {
        let Segment::Placeholder(name) = segment else {
            continue;
        };
        if !allowed.contains(&name) {
            return Err(ManifestError::InvalidTemplate {
                value: template.to_owned(),
                reason: format!(
                    "unknown placeholder {{{name}}}; expected one of: {}",
                    allowed.join(", ")
                ),
            });
        }
    }
    Ok(())
}

/// Expand every placeholder, failing on unknown or unset names.
///
/// # Errors
///
/// Returns [`ManifestError::InvalidTemplate`] if the template is malformed or
/// a placeholder has no value in `vars`.
///
/// # Examples
///
/// ```
/// use casket::manifest::template::{TemplateVars, expand};
///
/// let vars = TemplateVars {
///     version: Some("0.23.3".to_owned()),
///     ..TemplateVars::default()
/// };
/// let url = expand("https://example.com/app-{version}.dmg", &vars).expect("expands");
/// assert_eq!(url, "https://example.com/app-0.23.3.dmg");
/// ```
pub fn expand(template: &str, vars: &TemplateVars) -> Result<String> {
    let mut output = String::with_capacity(template.len());
    for segment in scan(template)? {
        match segment {
            Segment::Literal(text) => output.push_str(text),
            Segment::Placeholder(name) => {
                let value = vars
                    .lookup(name)
                    .ok_or_else(|| ManifestError::InvalidTemplate {
                        value: template.to_owned(),
                        reason: format!("no value for placeholder {{{name}}}"),
                    })?;
                output.push_str(&value);
            }
        }
    }
    Ok(output)
}

/// Expand known placeholders and keep everything else as written.
#[must_use]
pub fn expand_lenient(template: &str, vars: &TemplateVars) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;
    while let Some((before, after)) = rest.split_once('{') {
        output.push_str(before);
        match after.split_once('}') {
            Some((name, tail)) => {
                match vars.lookup(name.trim()) {
                    Some(value) => output.push_str(&value),
                    None => {
                        output.push('{');
                        output.push_str(name);
                        output.push('}');
                    }
                }
                rest = tail;
            }
            None => {
                output.push('{');
                rest = after;
                break;
            }
        }
    }
    output.push_str(rest);
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn vars() -> TemplateVars {
        TemplateVars {
            token: Some("pikachuexe-freetube".to_owned()),
            version: Some("0.23.3".to_owned()),
            appdir: Some("/Applications".to_owned()),
        }
    }

    #[test]
    fn expands_repeated_placeholders() {
        let url = expand(
            "https://github.com/x/y/releases/download/v{version}-beta/freetube-{version}-mac-arm64.dmg",
            &vars(),
        )
        .expect("expands");
        assert_eq!(
            url,
            "https://github.com/x/y/releases/download/v0.23.3-beta/freetube-0.23.3-mac-arm64.dmg"
        );
    }

    #[rstest]
    #[case("{version.major}", "0")]
    #[case("{version.minor}", "23")]
    #[case("{version.patch}", "3")]
    #[case("{appdir}/FreeTube.app", "/Applications/FreeTube.app")]
    #[case("no placeholders", "no placeholders")]
    fn expands_derived_values(#[case] template: &str, #[case] expected: &str) {
        assert_eq!(expand(template, &vars()).expect("expands"), expected);
    }

    #[rstest]
    #[case::unclosed("app-{version.dmg")]
    #[case::empty("app-{}.dmg")]
    fn scan_rejects_malformed_templates(#[case] template: &str) {
        assert!(scan(template).is_err());
    }

    #[test]
    fn validate_rejects_unknown_placeholder() {
        let err = validate("{homedir}/x", &["appdir", "token"]).expect_err("unknown name");
        assert!(err.to_string().contains("unknown placeholder {homedir}"));
    }

    #[test]
    fn expand_fails_on_unset_value() {
        let result = expand("{appdir}", &TemplateVars::default());
        assert!(result.is_err());
    }

    #[rstest]
    #[case("This Cask, `{token}`, is fine", "This Cask, `pikachuexe-freetube`, is fine")]
    #[case("json: {\"a\": 1}", "json: {\"a\": 1}")]
    #[case("dangling {brace", "dangling {brace")]
    fn lenient_expansion_preserves_unknown_text(#[case] template: &str, #[case] expected: &str) {
        assert_eq!(expand_lenient(template, &vars()), expected);
    }
}
