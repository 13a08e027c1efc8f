//! Per-token advisory locks.
//!
//! Two casket processes must not act on the same package at once. Each
//! action takes an exclusive lock on `<caskroom>/<token>.lock` for its
//! whole duration; the lock is released when the guard is dropped.

use crate::error::{InstallerError, Result};
use crate::manifest::token::Token;
use camino::{Utf8Path, Utf8PathBuf};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;

/// Held lock for one token.
#[derive(Debug)]
pub struct TokenLock {
    file: File,
    path: Utf8PathBuf,
}

impl TokenLock {
    /// Takes the lock for `token`, failing immediately if it is held.
    ///
    /// # Errors
    ///
    /// Returns [`InstallerError::Locked`] when another process holds the
    /// lock and [`InstallerError::Io`] if the lock file cannot be opened.
    pub fn acquire(caskroom: &Utf8Path, token: &Token) -> Result<Self> {
        std::fs::create_dir_all(caskroom)?;
        let path = caskroom.join(format!("{token}.lock"));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        match fs2::FileExt::try_lock_exclusive(&file) {
            Ok(()) => {
                log::trace!("locked {path}");
                Ok(Self { file, path })
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => Err(InstallerError::Locked {
                token: token.clone(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for TokenLock {
    fn drop(&mut self) {
        if fs2::FileExt::unlock(&self.file).is_err() {
            log::debug!("failed to unlock {}", self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Token {
        Token::try_from("demo").expect("token")
    }

    #[test]
    fn second_acquire_is_locked_until_release() {
        let temp = tempfile::tempdir().expect("temp dir");
        let caskroom = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8");

        let first = TokenLock::acquire(&caskroom, &token()).expect("first lock");
        let err = TokenLock::acquire(&caskroom, &token()).expect_err("already locked");
        assert!(matches!(err, InstallerError::Locked { .. }));

        drop(first);
        TokenLock::acquire(&caskroom, &token()).expect("lock after release");
    }

    #[test]
    fn lock_file_is_named_after_token() {
        let temp = tempfile::tempdir().expect("temp dir");
        let caskroom = Utf8PathBuf::try_from(temp.path().to_path_buf()).expect("UTF-8");
        let lock = TokenLock::acquire(&caskroom, &token()).expect("lock");
        assert_eq!(lock.path(), caskroom.join("demo.lock"));
    }
}
