//! Writing the uninstall archive and install record.

use super::data::UninstallData;
use super::error::{Result, UninstallError};
use super::install_log::InstallLog;
use super::{
    ADDITIONAL_LOG_ENTRY, EXECUTABLES_ENTRY, INSTALL_LOG_ENTRY, INSTALL_RECORD_FILE,
    INSTALLER_LOCATION_ENTRY, SCRIPTS_DIR, UNINSTALL_ARCHIVE,
};
use crate::install_data::{INSTALL_LOG_PATH, InstallData};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// `INSTALL_LOG_PATH` value selecting the uninstaller directory.
pub const DEFAULT_LOG_PATH: &str = "default";

/// Summary of an installation written next to the uninstall data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstallRecord<'a> {
    /// Application name.
    pub app_name: &'a str,
    /// Application version.
    pub app_version: &'a str,
    /// Installation directory.
    pub install_path: &'a str,
    /// Installed packs, in installation order.
    pub packs: Vec<&'a str>,
    /// ISO3 code of the installer language.
    pub language: &'a str,
}

/// Writes the uninstall archive for a finished installation.
#[derive(Clone, Copy, Debug)]
pub struct UninstallDataWriter<'a> {
    data: &'a InstallData,
    installer_location: Option<&'a Utf8Path>,
}

impl<'a> UninstallDataWriter<'a> {
    /// Writer for the installation described by `data`.
    #[must_use]
    pub const fn new(data: &'a InstallData) -> Self {
        Self {
            data,
            installer_location: None,
        }
    }

    /// Records where the installer artifact lives.
    #[must_use]
    pub const fn with_installer_location(mut self, location: &'a Utf8Path) -> Self {
        self.installer_location = Some(location);
        self
    }

    /// Whether uninstall data should be written at all.
    #[must_use]
    pub fn is_uninstallation_required(&self) -> bool {
        let info = &self.data.model.info;
        info.write_uninstaller
            && info
                .uninstaller_condition
                .as_deref()
                .is_none_or(|condition| self.data.rules.is_true(condition, &self.data.variables))
    }

    /// Directory receiving the uninstall data.
    #[must_use]
    pub fn uninstaller_dir(&self) -> Utf8PathBuf {
        Utf8Path::new(self.data.install_path()).join(&self.data.model.info.uninstaller_name)
    }

    /// Writes the uninstall archive and the optional extra files, returning
    /// the archive path, or `None` when uninstallation is not required.
    ///
    /// The logged paths include the uninstaller directory and the files
    /// written here, so a complete uninstallation leaves nothing behind.
    ///
    /// # Errors
    ///
    /// Returns [`UninstallError::Io`] or [`UninstallError::Archive`] when a
    /// file cannot be written.
    pub fn write(&self, uninstall: &UninstallData) -> Result<Option<Utf8PathBuf>> {
        if !self.is_uninstallation_required() {
            debug!("uninstall data not required");
            return Ok(None);
        }
        let dir = self.uninstaller_dir();
        fs::create_dir_all(&dir).map_err(|err| UninstallError::io(&dir, err))?;
        let archive = dir.join(UNINSTALL_ARCHIVE);
        let record = dir.join(INSTALL_RECORD_FILE);
        let log_path = self.external_log_path(&dir);

        let mut logged = uninstall.clone();
        logged.add_file(dir.as_str());
        logged.add_file(archive.as_str());
        if self.data.model.info.write_install_record {
            logged.add_file(record.as_str());
        }
        if let Some(inside) = log_path
            .as_ref()
            .filter(|path| path.starts_with(self.data.install_path()))
        {
            logged.add_file(inside.as_str());
        }
        self.write_archive(&archive, &logged)?;
        info!("wrote uninstall data to {archive}");

        if let Some(log_path) = log_path {
            let mut text = Vec::new();
            InstallLog::write(&mut text, self.data.install_path(), uninstall.files())
                .and_then(|()| fs::write(&log_path, text))
                .map_err(|err| UninstallError::io(&log_path, err))?;
            debug!("wrote install log to {log_path}");
        }
        if self.data.model.info.write_install_record {
            self.write_record(&record)?;
        }
        Ok(Some(archive))
    }

    fn external_log_path(&self, dir: &Utf8Path) -> Option<Utf8PathBuf> {
        let value = self.data.variables.get(INSTALL_LOG_PATH)?.trim();
        if value.is_empty() {
            None
        } else if value.eq_ignore_ascii_case(DEFAULT_LOG_PATH) {
            Some(dir.join(INSTALL_LOG_ENTRY))
        } else {
            Some(Utf8PathBuf::from(self.data.substitute(value)))
        }
    }

    fn write_archive(&self, archive: &Utf8Path, uninstall: &UninstallData) -> Result<()> {
        let file = File::create(archive).map_err(|err| UninstallError::io(archive, err))?;
        let mut zip = ZipWriter::new(BufWriter::new(file));
        let zip_err = |err| UninstallError::archive(archive, err);
        let io_err = |err| UninstallError::io(archive, err);
        let options = SimpleFileOptions::default();

        zip.start_file(INSTALL_LOG_ENTRY, options).map_err(zip_err)?;
        InstallLog::write(&mut zip, self.data.install_path(), uninstall.files())
            .map_err(io_err)?;

        zip.start_file(EXECUTABLES_ENTRY, options).map_err(zip_err)?;
        let executables = serde_json::to_vec_pretty(uninstall.executables()).map_err(|source| {
            UninstallError::Json {
                entry: EXECUTABLES_ENTRY.to_owned(),
                source,
            }
        })?;
        zip.write_all(&executables).map_err(io_err)?;

        for (index, script) in uninstall.scripts().iter().enumerate() {
            zip.start_file(format!("{SCRIPTS_DIR}{index}"), options)
                .map_err(zip_err)?;
            zip.write_all(script.as_bytes()).map_err(io_err)?;
        }

        if !uninstall.log_lines().is_empty() {
            zip.start_file(ADDITIONAL_LOG_ENTRY, options).map_err(zip_err)?;
            for line in uninstall.log_lines() {
                writeln!(zip, "{line}").map_err(io_err)?;
            }
        }

        if let Some(location) = self.installer_location {
            zip.start_file(INSTALLER_LOCATION_ENTRY, options)
                .map_err(zip_err)?;
            zip.write_all(location.as_str().as_bytes()).map_err(io_err)?;
        }

        zip.finish()
            .map_err(zip_err)?
            .flush()
            .map_err(io_err)
    }

    fn write_record(&self, path: &Utf8Path) -> Result<()> {
        let record = InstallRecord {
            app_name: &self.data.model.info.app_name,
            app_version: &self.data.model.info.app_version,
            install_path: self.data.install_path(),
            packs: self
                .data
                .selected_packs()
                .map(|(_, pack)| pack.name.as_str())
                .collect(),
            language: self.data.localiser().iso3(),
        };
        let json = serde_json::to_vec_pretty(&record).map_err(|source| UninstallError::Json {
            entry: INSTALL_RECORD_FILE.to_owned(),
            source,
        })?;
        fs::write(path, json).map_err(|err| UninstallError::io(path, err))?;
        debug!("wrote install record to {path}");
        Ok(())
    }
}
