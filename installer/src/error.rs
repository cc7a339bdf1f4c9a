//! Error types for the installer runtime.
//!
//! Variants name the file, panel or resource at fault so the console and
//! automated front ends can report a failure without a backtrace.

use crate::uninstall::UninstallError;
use camino::Utf8PathBuf;
use instill_common::rules::RulesError;
use instill_common::spanning::SpanningError;
use instill_common::variables::VariableError;
use instill_common::xml::XmlError;
use thiserror::Error;

/// Errors that can occur while installing.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The command line could not be parsed.
    #[error(transparent)]
    Usage(#[from] clap::Error),

    /// A single-dash option was given without its value.
    #[error("Option \"{option}\" requires an argument!")]
    MissingArgument {
        /// The option as typed.
        option: String,
    },

    /// Reading or writing a file failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// Path being accessed.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the console failed.
    #[error("console I/O failed: {0}")]
    Console(#[source] std::io::Error),

    /// The installer artifact or the uninstall archive is not a valid zip.
    #[error("archive error in {path}: {source}")]
    Archive {
        /// Archive path.
        path: Utf8PathBuf,
        /// Underlying zip error.
        #[source]
        source: zip::result::ZipError,
    },

    /// A resource the installer needs is not in the artifact.
    #[error("resource {name} not found in the installer")]
    MissingResource {
        /// Artifact entry name.
        name: String,
    },

    /// A JSON resource is malformed or could not be written.
    #[error("JSON error in {resource}: {source}")]
    Json {
        /// Resource or file concerned.
        resource: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// An XML document (conditions, automation data) is malformed.
    #[error(transparent)]
    Xml(#[from] XmlError),

    /// The bundled conditions could not be read.
    #[error(transparent)]
    Rules(#[from] RulesError),

    /// Reading the volume set failed.
    #[error(transparent)]
    Spanning(#[from] SpanningError),

    /// A dynamic variable could not be refreshed.
    #[error(transparent)]
    Variable(#[from] VariableError),

    /// Uninstall data could not be written.
    #[error(transparent)]
    Uninstall(#[from] UninstallError),

    /// The installation names a panel class the runtime does not provide.
    #[error("unknown panel class {class}")]
    UnknownPanel {
        /// Panel class name.
        class: String,
    },

    /// A panel names a validator the runtime does not provide.
    #[error("panel {panel} uses unknown validator {validator}")]
    UnknownValidator {
        /// Panel id.
        panel: String,
        /// Validator class name.
        validator: String,
    },

    /// A panel's validator rejected the entered data.
    #[error("panel {panel} failed validation: {message}")]
    ValidationFailed {
        /// Panel id.
        panel: String,
        /// Validator message.
        message: String,
    },

    /// The automation data has no section for a panel.
    #[error("no automation data for panel {panel}")]
    MissingPanelData {
        /// Panel id.
        panel: String,
    },

    /// A properties file lacks a value the installation needs.
    #[error("property {key} is required")]
    MissingProperty {
        /// Property name.
        key: String,
    },

    /// The pack selection is inconsistent.
    #[error("invalid pack selection: {reason}")]
    InvalidSelection {
        /// What is wrong with it.
        reason: String,
    },

    /// A resolved target lies outside the installation directory.
    #[error("refusing to write {path} outside the installation directory")]
    PathTraversal {
        /// Resolved target path.
        path: String,
    },

    /// An unpacked file has the wrong length.
    #[error("size mismatch for {path}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Installed path.
        path: Utf8PathBuf,
        /// Length recorded by the compiler.
        expected: u64,
        /// Length actually written.
        actual: u64,
    },

    /// An unpacked file has the wrong digest.
    #[error("digest mismatch for {path}")]
    DigestMismatch {
        /// Installed path.
        path: Utf8PathBuf,
    },

    /// A post-install executable failed and its policy is to abort.
    #[error("executable {path} failed: {status}")]
    ExecutableFailed {
        /// Executable path.
        path: Utf8PathBuf,
        /// Exit status or spawn error.
        status: String,
    },

    /// Another installer for the same application holds the lock.
    #[error("another installer is running (lock file {path})")]
    Locked {
        /// Lock file path.
        path: Utf8PathBuf,
    },

    /// The user ended the installation.
    #[error("installation aborted")]
    Aborted,
}

impl InstallerError {
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

/// Result type alias for installer operations.
pub type Result<T> = std::result::Result<T, InstallerError>;
