//! Platform directory lookup behind a mockable trait.
//!
//! The installer needs the user's home (for `USER_HOME` and the default
//! installation path) and a temporary directory (for the lock file). Both
//! come from [`directories_next`] in production and from mocks in tests.

use std::path::PathBuf;

/// Source of platform directories.
#[cfg_attr(test, mockall::automock)]
pub trait BaseDirs {
    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// Directory for short-lived files such as the installer lock.
    fn temp_dir(&self) -> PathBuf;
}

/// [`BaseDirs`] backed by the running system.
///
/// # Examples
///
/// ```
/// use instill_installer::dirs::{BaseDirs, SystemBaseDirs};
///
/// let dirs = SystemBaseDirs::new();
/// assert!(dirs.temp_dir().is_absolute());
/// ```
#[derive(Clone, Debug, Default)]
pub struct SystemBaseDirs {
    dirs: Option<directories_next::BaseDirs>,
}

impl SystemBaseDirs {
    /// Resolves the current user's directories.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirs: directories_next::BaseDirs::new(),
        }
    }
}

impl BaseDirs for SystemBaseDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        self.dirs
            .as_ref()
            .map(|dirs| dirs.home_dir().to_path_buf())
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }
}
