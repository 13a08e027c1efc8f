//! Artifact download over HTTP.
//!
//! Provides a trait-based abstraction for fetching artifacts and livecheck
//! pages, enabling dependency injection for testing.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default whole-request time limit for downloads.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for fetching remote resources.
///
/// Abstractions allow tests to mock HTTP behaviour without network access.
///
/// # Examples
///
/// ```
/// use casket::artefact::download::{DEFAULT_DOWNLOAD_TIMEOUT, HttpDownloader};
///
/// let downloader = HttpDownloader::new(DEFAULT_DOWNLOAD_TIMEOUT);
/// // Use downloader.download_to(url, dest) in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait ArtefactDownloader {
    /// Download `url` into the file at `dest`.
    ///
    /// `dest` is only created once the whole body has arrived.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    fn download_to(&self, url: &str, dest: &Path) -> Result<(), DownloadError>;

    /// Fetch `url` and return the body as text.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not UTF-8.
    fn fetch_text(&self, url: &str) -> Result<String, DownloadError>;
}

/// Errors arising from download operations.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// HTTP request failed.
    #[error("download failed for {url}: {reason}")]
    HttpError {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The server answered 404.
    #[error("not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error writing the downloaded file.
    #[error("I/O error writing download: {0}")]
    Io(#[from] std::io::Error),
}

/// HTTP-based downloader using `ureq`.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    agent: ureq::Agent,
}

impl HttpDownloader {
    /// Creates a downloader whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl ArtefactDownloader for HttpDownloader {
    fn download_to(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        log::debug!("downloading {url} to {}", dest.display());
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;

        let partial = partial_path(dest);
        let written = std::fs::File::create(&partial).and_then(|mut file| {
            std::io::copy(&mut response.into_body().as_reader(), &mut file)?;
            file.sync_all()
        });
        if let Err(err) = written {
            discard_partial(&partial);
            return Err(DownloadError::HttpError {
                url: url.to_owned(),
                reason: err.to_string(),
            });
        }
        std::fs::rename(&partial, dest)?;
        Ok(())
    }

    fn fetch_text(&self, url: &str) -> Result<String, DownloadError> {
        log::debug!("fetching {url}");
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        response
            .into_body()
            .read_to_string()
            .map_err(|e| DownloadError::HttpError {
                url: url.to_owned(),
                reason: e.to_string(),
            })
    }
}

/// Removes an abandoned partial download, logging anything but absence.
fn discard_partial(partial: &Path) {
    match std::fs::remove_file(partial) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("could not remove {}: {e}", partial.display()),
    }
}

/// Sibling path the body is streamed into before the final rename.
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

/// Map a ureq error to a [`DownloadError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> DownloadError {
    match err {
        ureq::Error::StatusCode(404) => DownloadError::NotFound {
            url: url.to_owned(),
        },
        other => DownloadError::HttpError {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
