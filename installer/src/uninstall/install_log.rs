//! The leaf-first `install.log` format.

use super::error::{Result, UninstallError};
use std::collections::BTreeSet;
use std::io::{self, Write};

/// The `install.log` entry: the installation path, then every installed path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallLog {
    /// Installation directory.
    pub install_path: String,
    /// Installed paths, longest first within each directory so children
    /// precede their parents.
    pub files: Vec<String>,
}

impl InstallLog {
    /// Parses log text.
    ///
    /// ```
    /// use instill_installer::uninstall::InstallLog;
    ///
    /// let log = InstallLog::read("/opt/demo\n/opt/demo/bin\n/opt/demo/bin/run\n").unwrap();
    /// assert_eq!(log.install_path, "/opt/demo");
    /// assert_eq!(log.files, ["/opt/demo/bin/run", "/opt/demo/bin"]);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`UninstallError::EmptyInstallPath`] when the first line is
    /// missing or blank.
    pub fn read(text: &str) -> Result<Self> {
        let mut lines = text.lines();
        let install_path = lines
            .next()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .ok_or(UninstallError::EmptyInstallPath)?
            .to_owned();
        let files: BTreeSet<&str> = lines.filter(|line| !line.trim().is_empty()).collect();
        Ok(Self {
            install_path,
            files: files.into_iter().rev().map(str::to_owned).collect(),
        })
    }

    /// Writes the log for `install_path` and `files`.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    pub fn write<'a>(
        out: &mut dyn Write,
        install_path: &str,
        files: impl IntoIterator<Item = &'a str>,
    ) -> io::Result<()> {
        writeln!(out, "{install_path}")?;
        for file in files {
            writeln!(out, "{file}")?;
        }
        Ok(())
    }
}
