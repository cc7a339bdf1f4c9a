//! Reading uninstall data and removing an installation.

use super::data::UninstallExecutable;
use super::error::{Result, UninstallError};
use super::install_log::InstallLog;
use super::{EXECUTABLES_ENTRY, INSTALL_LOG_ENTRY, SCRIPTS_DIR};
use crate::executor::{CommandExecutor, describe_failure};
use camino::{Utf8Path, Utf8PathBuf};
use instill_common::model::FailurePolicy;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, Read, Write};
use zip::ZipArchive;
use zip::result::ZipError;

/// Contents of an `uninstall.zip`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UninstallArchive {
    /// Installed paths, leaf-first.
    pub log: InstallLog,
    /// Executables to run before removing files.
    pub executables: Vec<UninstallExecutable>,
    /// Scripts to run after removing files.
    pub scripts: Vec<String>,
}

impl UninstallArchive {
    /// Reads the archive at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`UninstallError::MissingEntry`] when the install log is
    /// absent, and the I/O, archive or JSON variants for unreadable data.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| UninstallError::io(path, err))?;
        let mut zip = ZipArchive::new(file).map_err(|err| UninstallError::archive(path, err))?;

        let log = read_entry(&mut zip, path, INSTALL_LOG_ENTRY)?.ok_or_else(|| {
            UninstallError::MissingEntry {
                path: path.to_owned(),
                entry: INSTALL_LOG_ENTRY.to_owned(),
            }
        })?;
        let log = InstallLog::read(&log)?;

        let executables = match read_entry(&mut zip, path, EXECUTABLES_ENTRY)? {
            Some(json) => serde_json::from_str(&json).map_err(|source| UninstallError::Json {
                entry: EXECUTABLES_ENTRY.to_owned(),
                source,
            })?,
            None => Vec::new(),
        };

        let mut scripts: Vec<String> = Vec::new();
        loop {
            let name = format!("{SCRIPTS_DIR}{}", scripts.len());
            match read_entry(&mut zip, path, &name)? {
                Some(script) => scripts.push(script),
                None => break,
            }
        }

        Ok(Self {
            log,
            executables,
            scripts,
        })
    }
}

fn read_entry(zip: &mut ZipArchive<File>, path: &Utf8Path, name: &str) -> Result<Option<String>> {
    let mut entry = match zip.by_name(name) {
        Ok(entry) => entry,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(err) => return Err(UninstallError::archive(path, err)),
    };
    let mut text = String::new();
    entry
        .read_to_string(&mut text)
        .map_err(|err| UninstallError::io(path, err))?;
    Ok(Some(text))
}

/// What an uninstallation achieved.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DestroyReport {
    /// Number of paths removed.
    pub removed: usize,
    /// Paths that still exist afterwards.
    pub failed: Vec<Utf8PathBuf>,
}

impl DestroyReport {
    /// Whether everything was removed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Removes an installation described by an [`UninstallArchive`].
pub struct Destroyer<'a> {
    executor: &'a dyn CommandExecutor,
    force: bool,
}

impl<'a> Destroyer<'a> {
    /// Destroyer running executables and scripts through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self {
            executor,
            force: false,
        }
    }

    /// Also deletes files the installer did not create.
    #[must_use]
    pub const fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Runs the uninstallation.
    ///
    /// Empty directories are swept afterwards. Without [`Self::force`] the
    /// sweep only visits logged directories and the parents of logged
    /// files, so directories the installer never created are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`UninstallError::ExecutableFailed`] when an executable whose
    /// policy is to abort fails; nothing has been deleted at that point.
    pub fn destroy(&self, archive: &UninstallArchive) -> Result<DestroyReport> {
        info!("uninstalling {}", archive.log.install_path);
        for executable in &archive.executables {
            self.run_executable(executable)?;
        }

        let mut report = DestroyReport::default();
        for file in &archive.log.files {
            if remove(Utf8Path::new(file)) {
                report.removed += 1;
            }
        }
        for script in &archive.scripts {
            self.run_script(script);
        }

        let install_path = Utf8Path::new(&archive.log.install_path);
        let owned = logged_dirs(archive);
        self.cleanup(install_path, &owned, &mut report);

        report.failed = archive
            .log
            .files
            .iter()
            .map(Utf8PathBuf::from)
            .filter(|path| path.exists())
            .collect();
        if install_path.exists() {
            report.failed.push(install_path.to_owned());
        }
        Ok(report)
    }

    fn run_executable(&self, executable: &UninstallExecutable) -> Result<()> {
        let args: Vec<&str> = executable.arguments.iter().map(String::as_str).collect();
        let status = match self.executor.run(&executable.path, &args) {
            Ok(output) if output.status.success() => return Ok(()),
            Ok(output) => describe_failure(&output),
            Err(err) => err.to_string(),
        };
        match executable.failure {
            FailurePolicy::Abort => Err(UninstallError::ExecutableFailed {
                path: executable.path.clone(),
                status,
            }),
            FailurePolicy::Warn => {
                warn!("uninstall executable {} failed: {status}", executable.path);
                Ok(())
            }
            FailurePolicy::Ignore => {
                debug!("uninstall executable {} failed: {status}", executable.path);
                Ok(())
            }
        }
    }

    fn run_script(&self, script: &str) {
        let outcome = tempfile::Builder::new()
            .prefix("instill-uninstall-")
            .suffix(".sh")
            .tempfile()
            .and_then(|mut file| {
                file.write_all(script.as_bytes())?;
                file.flush()?;
                let path = file.path().to_string_lossy().into_owned();
                self.executor.run("sh", &[path.as_str()])
            });
        match outcome {
            Ok(output) if output.status.success() => debug!("uninstall script succeeded"),
            Ok(output) => warn!("uninstall script failed: {}", describe_failure(&output)),
            Err(err) => warn!("uninstall script could not run: {err}"),
        }
    }

    fn cleanup(&self, dir: &Utf8Path, owned: &BTreeSet<&Utf8Path>, report: &mut DestroyReport) {
        let Ok(entries) = dir.read_dir_utf8() else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() && !path.is_symlink() {
                if self.force || owned.contains(path) {
                    self.cleanup(path, owned, report);
                }
            } else if self.force && remove(path) {
                report.removed += 1;
            }
        }
        if remove(dir) {
            report.removed += 1;
        }
    }
}

/// Logged paths and their ancestors inside the installation directory.
fn logged_dirs(archive: &UninstallArchive) -> BTreeSet<&Utf8Path> {
    let install_path = Utf8Path::new(&archive.log.install_path);
    archive
        .log
        .files
        .iter()
        .flat_map(|file| {
            Utf8Path::new(file)
                .ancestors()
                .take_while(|path| path.starts_with(install_path))
        })
        .collect()
}

/// Removes a file or an empty directory, returning whether it was removed.
fn remove(path: &Utf8Path) -> bool {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir(path),
        Ok(_) => fs::remove_file(path),
        Err(err) => Err(err),
    };
    match result {
        Ok(()) => {
            debug!("removed {path}");
            true
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            debug!("could not remove {path}: {err}");
            false
        }
    }
}

#[cfg(test)]
#[path = "destroyer_tests.rs"]
mod tests;
