//! One installer per application at a time.
//!
//! The lock is a file named after the application in the temporary
//! directory, held with an exclusive advisory lock for as long as the
//! [`InstallerLock`] lives. The file is removed on drop.

use crate::error::{InstallerError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use fs2::FileExt;
use log::{debug, warn};
use std::fs::{File, OpenOptions};

/// Outcome of [`InstallerLock::acquire`].
#[derive(Debug)]
pub enum LockStatus {
    /// The lock is ours until dropped.
    Acquired(InstallerLock),
    /// Another process holds the lock at this path.
    Held(Utf8PathBuf),
    /// The lock file could not be created; installation may proceed unguarded.
    Unavailable,
}

/// A held installer lock.
#[derive(Debug)]
pub struct InstallerLock {
    file: File,
    path: Utf8PathBuf,
}

impl InstallerLock {
    /// Tries to take the lock for `app_name` in `dir`.
    ///
    /// Failing to create the lock file is not fatal: it is logged and
    /// reported as [`LockStatus::Unavailable`].
    #[must_use]
    pub fn acquire(dir: &Utf8Path, app_name: &str) -> LockStatus {
        let path = lock_path(dir, app_name);
        let file = match OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
        {
            Ok(file) => file,
            Err(err) => {
                warn!("lock file {path} could not be created: {err}");
                warn!("multiple instances of the installer will be allowed");
                return LockStatus::Unavailable;
            }
        };
        match file.try_lock_exclusive() {
            Ok(()) => {
                debug!("created lock file {path}");
                LockStatus::Acquired(Self { file, path })
            }
            Err(err) => {
                debug!("lock file {path} is held: {err}");
                LockStatus::Held(path)
            }
        }
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for InstallerLock {
    fn drop(&mut self) {
        if let Err(err) = FileExt::unlock(&self.file) {
            debug!("failed to unlock {}: {err}", self.path);
        }
        if let Err(err) = std::fs::remove_file(&self.path) {
            debug!("failed to remove {}: {err}", self.path);
        }
    }
}

/// Lock file path for `app_name`; characters unsafe in file names become `_`.
#[must_use]
pub fn lock_path(dir: &Utf8Path, app_name: &str) -> Utf8PathBuf {
    let name: String = app_name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    dir.join(format!("{name}.lock"))
}

/// Takes the lock, failing when another installer holds it.
///
/// # Errors
///
/// Returns [`InstallerError::Locked`] when the lock is held.
pub fn require_lock(dir: &Utf8Path, app_name: &str) -> Result<Option<InstallerLock>> {
    match InstallerLock::acquire(dir, app_name) {
        LockStatus::Acquired(lock) => Ok(Some(lock)),
        LockStatus::Held(path) => Err(InstallerError::Locked { path }),
        LockStatus::Unavailable => Ok(None),
    }
}
