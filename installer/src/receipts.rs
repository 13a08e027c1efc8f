//! Installation receipts.
//!
//! Each installed package has `<caskroom>/<token>/receipt.json` recording
//! the version and the bundle paths that were written. Receipts drive
//! conflict checks, `list`, and uninstall when the manifest's `appdir`
//! has since changed.

use crate::error::{InstallerError, Result};
use crate::manifest::token::Token;
use crate::manifest::version::Version;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

const RECEIPT_FILE_NAME: &str = "receipt.json";

/// Record of one completed install.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// The installed package.
    pub token: Token,
    /// The installed version.
    pub version: Version,
    /// Absolute paths of the installed bundles.
    pub artifacts: Vec<Utf8PathBuf>,
    /// Seconds since the Unix epoch when the install finished.
    pub installed_at: u64,
}

impl Receipt {
    /// Creates a receipt stamped with the current time.
    #[must_use]
    pub fn new(token: Token, version: Version, artifacts: Vec<Utf8PathBuf>) -> Self {
        let installed_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_secs());
        Self {
            token,
            version,
            artifacts,
            installed_at,
        }
    }
}

/// Receipts stored under the Caskroom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptStore {
    caskroom: Utf8PathBuf,
}

impl ReceiptStore {
    /// Creates a store rooted at `caskroom`.
    #[must_use]
    pub fn new(caskroom: impl Into<Utf8PathBuf>) -> Self {
        Self {
            caskroom: caskroom.into(),
        }
    }

    /// The Caskroom directory.
    #[must_use]
    pub fn caskroom(&self) -> &Utf8Path {
        &self.caskroom
    }

    /// Where the receipt for `token` lives.
    #[must_use]
    pub fn path_for(&self, token: &Token) -> Utf8PathBuf {
        self.caskroom.join(token.as_str()).join(RECEIPT_FILE_NAME)
    }

    /// Whether a receipt exists for `token`.
    #[must_use]
    pub fn is_installed(&self, token: &Token) -> bool {
        self.path_for(token).is_file()
    }

    /// Loads the receipt for `token`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::CorruptReceipt`] when the file exists but
    /// cannot be read or parsed.
    pub fn load(&self, token: &Token) -> Result<Option<Receipt>> {
        let path = self.path_for(token);
        match std::fs::read_to_string(&path) {
            Ok(text) => read_receipt(&path, &text).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(InstallerError::CorruptReceipt {
                path,
                reason: e.to_string(),
            }),
        }
    }

    /// Writes `receipt`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Io`] if the file cannot be written.
    pub fn save(&self, receipt: &Receipt) -> Result<()> {
        let path = self.path_for(&receipt.token);
        let dir = self.caskroom.join(receipt.token.as_str());
        std::fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(receipt).map_err(std::io::Error::other)?;
        let mut scratch = tempfile::NamedTempFile::new_in(&dir)?;
        std::io::Write::write_all(&mut scratch, json.as_bytes())?;
        scratch.persist(&path).map_err(|e| e.error)?;
        log::debug!("wrote receipt {path}");
        Ok(())
    }

    /// Deletes the receipt directory for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Io`] if the directory exists but cannot be
    /// removed.
    pub fn remove(&self, token: &Token) -> Result<()> {
        let dir = self.caskroom.join(token.as_str());
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// All receipts, sorted by token. Unreadable receipts are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Io`] if the Caskroom exists but cannot be
    /// listed.
    pub fn list(&self) -> Result<Vec<Receipt>> {
        let entries = match std::fs::read_dir(&self.caskroom) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut receipts = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Ok(token) = Token::try_from(name.as_str()) else {
                continue;
            };
            match self.load(&token) {
                Ok(Some(receipt)) => receipts.push(receipt),
                Ok(None) => {}
                Err(e) => log::warn!("{e}"),
            }
        }
        receipts.sort_by(|a, b| a.token.cmp(&b.token));
        Ok(receipts)
    }
}

fn read_receipt(path: &Utf8Path, text: &str) -> Result<Receipt> {
    serde_json::from_str(text).map_err(|e| InstallerError::CorruptReceipt {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}
