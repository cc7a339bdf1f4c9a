//! Uninstall data and the uninstaller.
//!
//! A successful installation leaves `<install path>/<uninstaller>/uninstall.zip`
//! behind. The archive lists every installed path and the executables and
//! scripts to run; [`Destroyer`] consumes it to undo the installation.

mod data;
mod destroyer;
mod error;
mod install_log;
mod writer;

pub use data::{UninstallData, UninstallExecutable};
pub use destroyer::{DestroyReport, Destroyer, UninstallArchive};
pub use error::{Result, UninstallError};
pub use install_log::InstallLog;
pub use writer::{DEFAULT_LOG_PATH, InstallRecord, UninstallDataWriter};

/// File name of the uninstall archive.
pub const UNINSTALL_ARCHIVE: &str = "uninstall.zip";
/// Archive entry holding the install log.
pub const INSTALL_LOG_ENTRY: &str = "install.log";
/// Archive entry holding the uninstall executables.
pub const EXECUTABLES_ENTRY: &str = "executables.json";
/// Prefix of the numbered uninstall script entries.
pub const SCRIPTS_DIR: &str = "scripts/";
/// Archive entry recording where the installer artifact was run from.
pub const INSTALLER_LOCATION_ENTRY: &str = "installer-location";
/// Archive entry holding additional log lines.
pub const ADDITIONAL_LOG_ENTRY: &str = "additional.log";
/// File written next to the archive when install records are enabled.
pub const INSTALL_RECORD_FILE: &str = "install-record.json";
