//! Wiring from parsed arguments to a running installation.
//!
//! [`launch`] opens the artifact, picks the language, builds the
//! [`Session`] and hands it to the console or automated front end. The
//! binary supplies the real directories, executor and streams; tests supply
//! stubs.

use crate::automated::{AutomatedInstaller, automation_language, read_automation};
use crate::cli::{Cli, Mode};
use crate::console::{ConsoleInstaller, ConsoleIo, default_lock_dir};
use crate::dirs::BaseDirs;
use crate::error::{InstallerError, Result};
use crate::executor::CommandExecutor;
use crate::install_data::InstallData;
use crate::panels::check_panels;
use crate::resources::ResourceManager;
use crate::session::Session;
use camino::{Utf8Path, Utf8PathBuf};
use instill_common::i18n::resolve_localiser_from_env;
use log::{debug, info};
use std::io::Write;

/// File name of the installer artifact looked up beside the program.
pub const DEFAULT_ARTIFACT_NAME: &str = "install.zip";

/// Collaborators that differ between the binary and tests.
pub struct Launcher<'a> {
    dirs: &'a dyn BaseDirs,
    executor: &'a dyn CommandExecutor,
    lock_dir: Utf8PathBuf,
}

impl<'a> Launcher<'a> {
    /// Launcher locking in the temporary directory `dirs` reports.
    pub fn new(dirs: &'a dyn BaseDirs, executor: &'a dyn CommandExecutor) -> Self {
        let lock_dir =
            Utf8PathBuf::from_path_buf(dirs.temp_dir()).unwrap_or_else(|_| default_lock_dir());
        Self {
            dirs,
            executor,
            lock_dir,
        }
    }

    /// Takes the installer lock in `dir` instead.
    #[must_use]
    pub fn with_lock_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }
}

/// The artifact named on the command line, else `install.zip` beside the
/// running program.
///
/// # Errors
///
/// Returns [`InstallerError::MissingResource`] when the program's own
/// location cannot be determined.
pub fn artifact_path(explicit: Option<&Utf8Path>) -> Result<Utf8PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_owned());
    }
    beside_current_exe(DEFAULT_ARTIFACT_NAME)
}

/// `name` in the directory holding the running program.
///
/// # Errors
///
/// Returns [`InstallerError::MissingResource`] when the program's location
/// is unknown or not UTF-8.
pub fn beside_current_exe(name: &str) -> Result<Utf8PathBuf> {
    let missing = || InstallerError::MissingResource {
        name: name.to_owned(),
    };
    let exe = std::env::current_exe().map_err(|_| missing())?;
    let exe = Utf8PathBuf::from_path_buf(exe).map_err(|_| missing())?;
    let dir = exe.parent().ok_or_else(missing)?;
    Ok(dir.join(name))
}

/// Runs the installation `cli` asks for.
///
/// Console output goes to `console`; the automated and properties modes
/// also write progress to `out`.
///
/// # Errors
///
/// Propagates failures opening the artifact, reading the automation
/// document or running the panels.
pub fn launch(
    cli: &Cli,
    launcher: &Launcher<'_>,
    console: &mut dyn ConsoleIo,
    out: &mut dyn Write,
) -> Result<()> {
    let artifact = artifact_path(cli.installer.as_deref())?;
    info!("opening installer {artifact}");
    let mut resources = ResourceManager::open(artifact)?;
    let model = resources.model()?;
    check_panels(&model.panels)?;

    let mode = cli.mode();
    let automation = match &mode {
        Mode::Automated(path) => Some(read_automation(path)?),
        Mode::Console(_) => None,
    };
    let requested = cli
        .language
        .as_deref()
        .or_else(|| automation.as_ref().and_then(automation_language));
    let selection = resolve_localiser_from_env(requested, model.locales.first().map(String::as_str));
    selection.log_outcome("instill_installer");
    let localiser = selection.into_localiser();

    let data = InstallData::load(&mut resources, model, localiser, launcher.dirs)?;
    let mut session =
        Session::new(data, resources, launcher.executor).with_media_dir(cli.media.clone());
    debug!("reading media from {}", session.media_dir());

    match (mode, automation) {
        (Mode::Automated(_), Some(root)) => AutomatedInstaller::new(&mut session)
            .with_lock_dir(launcher.lock_dir.clone())
            .run(&root, out),
        (Mode::Console(action), _) => ConsoleInstaller::new(&mut session)
            .with_lock_dir(launcher.lock_dir.clone())
            .with_record(cli.record.clone())
            .run(action, console, out),
        (Mode::Automated(path), None) => Err(InstallerError::MissingResource {
            name: path.into_string(),
        }),
    }
}
