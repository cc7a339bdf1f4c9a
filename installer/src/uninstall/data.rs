//! Paths, executables and scripts collected for the uninstaller.

use instill_common::model::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An executable run by the uninstaller before any file is removed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UninstallExecutable {
    /// Absolute path of the installed executable.
    pub path: String,
    /// Arguments, already substituted.
    #[serde(default)]
    pub arguments: Vec<String>,
    /// What a failure means for the uninstallation.
    #[serde(default)]
    pub failure: FailurePolicy,
}

/// Everything the uninstaller needs to undo an installation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UninstallData {
    files: BTreeSet<String>,
    executables: Vec<UninstallExecutable>,
    scripts: Vec<String>,
    log_lines: Vec<String>,
}

impl UninstallData {
    /// Creates empty uninstall data.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an installed file or created directory.
    pub fn add_file(&mut self, path: impl Into<String>) {
        self.files.insert(path.into());
    }

    /// Installed paths in sorted order.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Registers an uninstall executable.
    pub fn add_executable(&mut self, executable: UninstallExecutable) {
        self.executables.push(executable);
    }

    /// Uninstall executables in registration order.
    #[must_use]
    pub fn executables(&self) -> &[UninstallExecutable] {
        &self.executables
    }

    /// Registers a shell script run after files are removed.
    pub fn add_script(&mut self, script: impl Into<String>) {
        self.scripts.push(script.into());
    }

    /// Uninstall scripts in registration order.
    #[must_use]
    pub fn scripts(&self) -> &[String] {
        &self.scripts
    }

    /// Adds a line to the additional log kept with the uninstall data.
    pub fn add_log_line(&mut self, line: impl Into<String>) {
        self.log_lines.push(line.into());
    }

    /// Lines of the additional log.
    #[must_use]
    pub fn log_lines(&self) -> &[String] {
        &self.log_lines
    }
}
