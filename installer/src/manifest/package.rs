//! The `PackageManifest` record.
//!
//! One manifest describes one installable bundle. The schema mirrors the
//! reference manifest shipped in `manifests/`:
//!
//! ```toml
//! token = "pikachuexe-freetube"
//! version = "0.23.3"
//! sha256 = "6deccaae5b298239f0ba620ea9f92580801284c104981d52a722c7da3d700c89"
//! url = "https://github.com/PikachuEXE/homebrew-FreeTube/releases/download/v{version}-beta/freetube-{version}-mac-arm64.dmg"
//! name = "FreeTube"
//! app = "FreeTube.app"
//!
//! [depends_on]
//! arch = "arm64"
//! macos = ">= big_sur"
//! ```

use super::artifact::AppArtifact;
use super::checksum::Sha256Digest;
use super::command::PostInstallCommand;
use super::depends_on::DependsOn;
use super::error::{ManifestError, Result};
use super::livecheck_rule::LivecheckRule;
use super::one_or_many;
use super::template::{self, TemplateVars};
use super::token::Token;
use super::uninstall_rule::{UninstallRule, ZapRule};
use super::url_template::UrlTemplate;
use super::version::Version;
use serde::Deserialize;

/// A parsed, validated package manifest.
///
/// Values are read-only once parsed; bumping a package means editing the
/// manifest file and parsing it again.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageManifest {
    token: Token,
    version: Version,
    sha256: Sha256Digest,
    url: UrlTemplate,
    #[serde(default, deserialize_with = "one_or_many::deserialize")]
    name: Vec<String>,
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    homepage: Option<String>,
    #[serde(default)]
    livecheck: Option<LivecheckRule>,
    #[serde(default, deserialize_with = "one_or_many::deserialize")]
    conflicts_with: Vec<Token>,
    #[serde(default)]
    depends_on: DependsOn,
    #[serde(deserialize_with = "one_or_many::deserialize")]
    app: Vec<AppArtifact>,
    #[serde(default)]
    postflight: Option<PostInstallCommand>,
    #[serde(default)]
    uninstall: UninstallRule,
    #[serde(default)]
    zap: ZapRule,
    #[serde(default)]
    caveats: Option<String>,
}

impl PackageManifest {
    /// The package token.
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// The package version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The expected SHA-256 digest of the downloaded artifact.
    #[must_use]
    pub fn sha256(&self) -> &Sha256Digest {
        &self.sha256
    }

    /// The unresolved download URL template.
    #[must_use]
    pub fn url(&self) -> &UrlTemplate {
        &self.url
    }

    /// Display names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.name
    }

    /// One-line description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    /// Project homepage.
    #[must_use]
    pub fn homepage(&self) -> Option<&str> {
        self.homepage.as_deref()
    }

    /// Upstream version detection rule.
    #[must_use]
    pub fn livecheck(&self) -> Option<&LivecheckRule> {
        self.livecheck.as_ref()
    }

    /// Tokens that must not be installed alongside this one.
    #[must_use]
    pub fn conflicts_with(&self) -> &[Token] {
        &self.conflicts_with
    }

    /// Platform constraints checked before any mutation.
    #[must_use]
    pub fn depends_on(&self) -> &DependsOn {
        &self.depends_on
    }

    /// Bundles copied into the applications directory, in order.
    #[must_use]
    pub fn apps(&self) -> &[AppArtifact] {
        &self.app
    }

    /// The optional post-install command.
    #[must_use]
    pub fn postflight(&self) -> Option<&PostInstallCommand> {
        self.postflight.as_ref()
    }

    /// Quit triggers applied before uninstall.
    #[must_use]
    pub fn uninstall(&self) -> &UninstallRule {
        &self.uninstall
    }

    /// Paths removed by zap.
    #[must_use]
    pub fn zap(&self) -> &ZapRule {
        &self.zap
    }

    /// Raw caveats text, before `{token}` substitution.
    #[must_use]
    pub fn caveats(&self) -> Option<&str> {
        self.caveats.as_deref()
    }

    /// Values for templates that do not depend on the install location.
    #[must_use]
    pub fn template_vars(&self) -> TemplateVars {
        TemplateVars {
            token: Some(self.token.to_string()),
            version: Some(self.version.to_string()),
            appdir: None,
        }
    }

    /// Resolve the download URL for this manifest's version.
    ///
    /// # Errors
    ///
    /// Only fails if the template references a version component the version
    /// does not have, e.g. `{version.patch}` for version `12`.
    pub fn download_url(&self) -> Result<String> {
        self.url.resolve(&self.template_vars())
    }

    /// Caveats with `{token}` and `{version}` substituted.
    #[must_use]
    pub fn rendered_caveats(&self) -> Option<String> {
        let vars = self.template_vars();
        self.caveats
            .as_deref()
            .map(|text| template::expand_lenient(text.trim_end(), &vars))
    }

    /// Check rules that span more than one field.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Inconsistent`] when no bundle is declared,
    /// when the package conflicts with itself, or when two bundles share a
    /// target name.
    pub fn validate(&self) -> Result<()> {
        let inconsistent = |reason: String| ManifestError::Inconsistent { reason };
        if self.app.is_empty() {
            return Err(inconsistent("at least one app is required".to_owned()));
        }
        if self.conflicts_with.contains(&self.token) {
            return Err(inconsistent(format!(
                "{} lists itself in conflicts_with",
                self.token
            )));
        }
        for (index, app) in self.app.iter().enumerate() {
            let duplicate = self
                .app
                .iter()
                .skip(index + 1)
                .any(|other| other.target() == app.target());
            if duplicate {
                return Err(inconsistent(format!(
                    "app target {} is declared twice",
                    app.target()
                )));
            }
        }
        self.download_url()?;
        Ok(())
    }
}
