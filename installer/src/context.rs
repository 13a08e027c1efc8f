//! Where an action reads from and writes to.

use crate::artefact::cache::DownloadCache;
use crate::config::Settings;
use crate::manifest::PackageManifest;
use crate::manifest::template::TemplateVars;
use crate::platform::HostPlatform;
use crate::receipts::ReceiptStore;
use crate::stager::Stager;
use camino::Utf8PathBuf;

/// Locations and host facts shared by every step of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    /// Where bundles are installed.
    pub appdir: Utf8PathBuf,
    /// The user's home directory, root of `~/` zap paths.
    pub home: Utf8PathBuf,
    /// Where receipts and locks live.
    pub caskroom: Utf8PathBuf,
    /// Where downloads are cached.
    pub cache_dir: Utf8PathBuf,
    /// The machine being installed onto.
    pub host: HostPlatform,
}

impl InstallContext {
    /// Builds a context from resolved settings.
    #[must_use]
    pub fn from_settings(settings: &Settings, host: HostPlatform) -> Self {
        Self {
            appdir: settings.appdir.clone(),
            home: settings.home.clone(),
            caskroom: settings.caskroom.clone(),
            cache_dir: settings.cache_dir.clone(),
            host,
        }
    }

    /// Template values for `manifest`, including `{appdir}`.
    #[must_use]
    pub fn template_vars(&self, manifest: &PackageManifest) -> TemplateVars {
        TemplateVars {
            appdir: Some(self.appdir.to_string()),
            ..manifest.template_vars()
        }
    }

    /// Stager for the applications directory.
    #[must_use]
    pub fn stager(&self) -> Stager {
        Stager::new(self.appdir.clone())
    }

    /// Receipt store under the Caskroom.
    #[must_use]
    pub fn receipts(&self) -> ReceiptStore {
        ReceiptStore::new(self.caskroom.clone())
    }

    /// Download cache.
    #[must_use]
    pub fn cache(&self) -> DownloadCache {
        DownloadCache::new(self.cache_dir.clone())
    }
}
