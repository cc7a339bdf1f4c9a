//! State carried through one installer run.

use crate::error::Result;
use crate::executor::CommandExecutor;
use crate::install_data::InstallData;
use crate::resources::ResourceManager;
use crate::uninstall::{UninstallData, UninstallDataWriter};
use crate::unpacker::{UnpackListener, UnpackSummary, Unpacker};
use camino::{Utf8Path, Utf8PathBuf};
use log::info;

/// Install data, the artifact it came from and what has been installed.
pub struct Session<'a> {
    /// Variables, rules and selection.
    pub data: InstallData,
    /// The installer artifact.
    pub resources: ResourceManager,
    /// Everything the uninstaller will need.
    pub uninstall: UninstallData,
    media_dir: Utf8PathBuf,
    executor: &'a dyn CommandExecutor,
    summary: Option<UnpackSummary>,
    uninstaller: Option<Utf8PathBuf>,
}

impl<'a> Session<'a> {
    /// Session reading volumes from the artifact's directory.
    pub fn new(
        data: InstallData,
        resources: ResourceManager,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        let media_dir = resources.directory();
        Self {
            data,
            resources,
            uninstall: UninstallData::new(),
            media_dir,
            executor,
            summary: None,
            uninstaller: None,
        }
    }

    /// Reads volumes and loose packs from `dir` instead.
    #[must_use]
    pub fn with_media_dir(mut self, dir: Option<Utf8PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.media_dir = dir;
        }
        self
    }

    /// Where volumes and loose packs are read from.
    #[must_use]
    pub fn media_dir(&self) -> &Utf8Path {
        &self.media_dir
    }

    /// Resolves the pack selection, unpacks the selected packs and writes
    /// the uninstall data.
    ///
    /// # Errors
    ///
    /// Propagates selection conflicts and unpacking or uninstall-data
    /// failures.
    pub fn install(&mut self, listener: &mut dyn UnpackListener) -> Result<UnpackSummary> {
        self.data.resolve_selection()?;
        let summary = Unpacker::new(&self.data, self.executor, &self.media_dir).unpack(
            &mut self.resources,
            listener,
            &mut self.uninstall,
        )?;
        let location = self.resources.path().to_owned();
        self.uninstaller = UninstallDataWriter::new(&self.data)
            .with_installer_location(&location)
            .write(&self.uninstall)?;
        info!(
            "installed {} file(s) from {} pack(s) into {}",
            summary.files,
            summary.packs,
            self.data.install_path()
        );
        self.summary = Some(summary);
        Ok(summary)
    }

    /// Totals of the installation, once it has happened.
    #[must_use]
    pub const fn summary(&self) -> Option<UnpackSummary> {
        self.summary
    }

    /// Whether packs have been installed.
    #[must_use]
    pub const fn is_installed(&self) -> bool {
        self.summary.is_some()
    }

    /// The uninstall archive written by [`Session::install`], if any.
    #[must_use]
    pub fn uninstaller(&self) -> Option<&Utf8Path> {
        self.uninstaller.as_deref()
    }
}
