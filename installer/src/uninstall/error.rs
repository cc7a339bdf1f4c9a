//! Errors raised while writing or consuming uninstall data.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors from the uninstall data writer and the destroyer.
#[derive(Debug, Error)]
pub enum UninstallError {
    /// Reading or writing a file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The uninstall archive is unreadable or could not be written.
    #[error("uninstall archive {path} is invalid: {source}")]
    Archive {
        /// Archive path.
        path: Utf8PathBuf,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// The uninstall archive lacks an entry.
    #[error("uninstall archive {path} has no {entry}")]
    MissingEntry {
        /// Archive path.
        path: Utf8PathBuf,
        /// Missing entry name.
        entry: String,
    },

    /// The install log does not start with the installation path.
    #[error("install log names no installation path")]
    EmptyInstallPath,

    /// The executables list is malformed.
    #[error("invalid {entry}: {source}")]
    Json {
        /// Entry or file concerned.
        entry: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An uninstall executable failed and its policy is to abort.
    #[error("uninstall executable {path} failed: {status}")]
    ExecutableFailed {
        /// Executable path.
        path: String,
        /// Exit status or spawn error.
        status: String,
    },
}

impl UninstallError {
    pub(crate) fn io(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(path: impl Into<Utf8PathBuf>, source: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for uninstall operations.
pub type Result<T> = std::result::Result<T, UninstallError>;
