//! Console front end.
//!
//! [`ConsoleIo`] is the seam between panels and the terminal: panels print
//! lines and ask questions through it, and tests substitute a scripted
//! console. [`ConsoleInstaller`] walks the panels interactively or drives
//! them from a properties file or the environment.

use crate::automated::record_installation;
use crate::error::{InstallerError, Result};
use crate::install_data::message_args;
use crate::lock::{InstallerLock, LockStatus};
use crate::panels::{PanelHandler, handler_for, is_shown};
use crate::properties::Properties;
use crate::session::Session;
use crate::unpacker::{UnpackListener, progress_message};
use crate::validators::validate;
use camino::{Utf8Path, Utf8PathBuf};
use instill_common::i18n::{FluentValue, Localiser};
use instill_common::model::{Pack, Panel};
use log::{debug, info, warn};
use std::io::{self, BufRead, Write};

/// Printed when a console installation succeeds.
pub const CONSOLE_DONE: &str = "[ Console installation done ]";
/// Printed when a console installation fails.
pub const CONSOLE_FAILED: &str = "[ Console installation FAILED! ]";

/// Line-oriented terminal access.
pub trait ConsoleIo {
    /// Prints `text` followed by a newline.
    ///
    /// # Errors
    ///
    /// Propagates write failures.
    fn print(&mut self, text: &str) -> io::Result<()>;

    /// Shows `prompt` and reads one line without its terminator; `None` at
    /// end of input.
    ///
    /// # Errors
    ///
    /// Propagates read and write failures.
    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// A console over a reader and a writer, usually stdin and stdout.
pub struct StdConsole<R, W> {
    input: R,
    output: W,
}

impl StdConsole<io::StdinLock<'static>, io::Stdout> {
    /// Console on the process's standard streams.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdConsole<R, W> {
    /// Console reading `input` and writing `output`.
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consumes the console, returning the writer.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> ConsoleIo for StdConsole<R, W> {
    fn print(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{text}")?;
        self.output.flush()
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt} ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }
}

/// Prints `text`.
///
/// # Errors
///
/// Returns [`InstallerError::Console`] when the console cannot be written.
pub fn say(console: &mut dyn ConsoleIo, text: &str) -> Result<()> {
    console.print(text).map_err(InstallerError::Console)
}

/// Asks for a line, trimmed; an empty answer yields `default`.
///
/// # Errors
///
/// Returns [`InstallerError::Aborted`] at end of input.
pub fn ask(console: &mut dyn ConsoleIo, prompt: &str, default: &str) -> Result<String> {
    let answer = console
        .prompt(prompt)
        .map_err(InstallerError::Console)?
        .ok_or(InstallerError::Aborted)?;
    let answer = answer.trim();
    Ok(if answer.is_empty() { default } else { answer }.to_owned())
}

/// Asks a yes/no question until the answer is understood.
///
/// # Errors
///
/// Returns [`InstallerError::Aborted`] at end of input.
pub fn confirm(
    console: &mut dyn ConsoleIo,
    localiser: &Localiser,
    prompt: &str,
    default: bool,
) -> Result<bool> {
    loop {
        let answer = ask(console, prompt, if default { "y" } else { "n" })?;
        match answer.to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => say(console, &invalid_choice(localiser, &answer))?,
        }
    }
}

/// Asks for a number between 1 and `count`, returning it zero-based.
///
/// # Errors
///
/// Returns [`InstallerError::Aborted`] at end of input.
pub fn choose(
    console: &mut dyn ConsoleIo,
    localiser: &Localiser,
    prompt: &str,
    count: usize,
    default: usize,
) -> Result<usize> {
    loop {
        let answer = ask(console, prompt, &(default + 1).to_string())?;
        match answer.parse::<usize>() {
            Ok(choice) if (1..=count).contains(&choice) => return Ok(choice - 1),
            _ => say(console, &invalid_choice(localiser, &answer))?,
        }
    }
}

fn invalid_choice(localiser: &Localiser, answer: &str) -> String {
    localiser.text(
        "console-invalid-choice",
        &message_args([("value", FluentValue::from(answer))]),
    )
}

/// Unpack listener that reports progress on the console and asks before
/// overwriting where the policy says so.
pub struct ConsoleListener<'c> {
    console: &'c mut dyn ConsoleIo,
    localiser: &'c Localiser,
}

impl<'c> ConsoleListener<'c> {
    /// Listener on `console`.
    pub fn new(console: &'c mut dyn ConsoleIo, localiser: &'c Localiser) -> Self {
        Self { console, localiser }
    }
}

impl UnpackListener for ConsoleListener<'_> {
    fn pack_started(&mut self, pack: &Pack, current: usize, total: usize) {
        let line = progress_message(self.localiser, pack, current, total);
        if let Err(err) = self.console.print(&line) {
            debug!("progress output failed: {err}");
        }
    }

    fn ask_overwrite(&mut self, path: &Utf8Path, default: bool) -> bool {
        let prompt = self.localiser.text(
            "console-overwrite-prompt",
            &message_args([
                ("path", FluentValue::from(path.as_str())),
                ("default", FluentValue::from(if default { "y" } else { "n" })),
            ]),
        );
        confirm(self.console, self.localiser, &prompt, default).unwrap_or_else(|err| {
            debug!("no overwrite answer for {path} ({err}); using the default");
            default
        })
    }
}

/// What a console run does.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsoleAction {
    /// Ask the user panel by panel.
    Install,
    /// Write a properties template covering every panel.
    GenerateProperties(Utf8PathBuf),
    /// Take every answer from a properties file.
    InstallFromProperties(Utf8PathBuf),
    /// Take every answer from the environment.
    InstallFromSystem,
    /// Take answers from a properties file, overridden by the environment.
    InstallFromSystemMerge(Utf8PathBuf),
}

/// Runs a console installation over a [`Session`].
pub struct ConsoleInstaller<'s, 'a> {
    session: &'s mut Session<'a>,
    lock_dir: Utf8PathBuf,
    record: Option<Utf8PathBuf>,
}

impl<'s, 'a> ConsoleInstaller<'s, 'a> {
    /// Installer taking its lock in the system temporary directory.
    pub fn new(session: &'s mut Session<'a>) -> Self {
        Self {
            session,
            lock_dir: default_lock_dir(),
            record: None,
        }
    }

    /// Takes the installer lock in `dir` instead.
    #[must_use]
    pub fn with_lock_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.lock_dir = dir.into();
        self
    }

    /// Writes an automated-installation document to `path` after a
    /// successful installation.
    #[must_use]
    pub fn with_record(mut self, path: Option<Utf8PathBuf>) -> Self {
        self.record = path;
        self
    }

    /// Performs `action`, printing the closing banner on `console`.
    ///
    /// # Errors
    ///
    /// Returns the first failure; the failure banner has been printed by
    /// then.
    pub fn run(
        &mut self,
        action: ConsoleAction,
        console: &mut dyn ConsoleIo,
        out: &mut dyn Write,
    ) -> Result<()> {
        let outcome = self.perform(action, console, out);
        match &outcome {
            Ok(()) => say(console, CONSOLE_DONE)?,
            Err(err) => {
                warn!("console installation failed: {err}");
                say(console, CONSOLE_FAILED)?;
            }
        }
        outcome
    }

    fn perform(
        &mut self,
        action: ConsoleAction,
        console: &mut dyn ConsoleIo,
        out: &mut dyn Write,
    ) -> Result<()> {
        if let ConsoleAction::GenerateProperties(path) = &action {
            return self.generate_properties(path, console);
        }
        let _lock = self.lock(console)?;
        match action {
            ConsoleAction::Install => self.interactive(console)?,
            ConsoleAction::InstallFromProperties(path) => {
                self.from_properties(&Properties::load(&path)?, out)?;
            }
            ConsoleAction::InstallFromSystem => self.from_properties(&Properties::from_env(), out)?,
            ConsoleAction::InstallFromSystemMerge(path) => {
                let mut properties = Properties::load(&path)?;
                properties.merge(Properties::from_env());
                self.from_properties(&properties, out)?;
            }
            ConsoleAction::GenerateProperties(_) => {}
        }
        if let Some(record) = &self.record {
            record_installation(self.session, record)?;
            let message = self.session.data.message(
                "record-written",
                &message_args([("path", FluentValue::from(record.as_str()))]),
            );
            say(console, &message)?;
        }
        Ok(())
    }

    fn lock(&self, console: &mut dyn ConsoleIo) -> Result<Option<InstallerLock>> {
        let app = &self.session.data.model.info.app_name;
        match InstallerLock::acquire(&self.lock_dir, app) {
            LockStatus::Acquired(lock) => Ok(Some(lock)),
            LockStatus::Unavailable => Ok(None),
            LockStatus::Held(path) => {
                let prompt = self.session.data.message(
                    "console-lock-held",
                    &message_args([
                        ("app", FluentValue::from(app.as_str())),
                        ("path", FluentValue::from(path.as_str())),
                    ]),
                );
                if confirm(console, self.session.data.localiser(), &prompt, false)? {
                    warn!("continuing although {path} is held");
                    Ok(None)
                } else {
                    Err(InstallerError::Locked { path })
                }
            }
        }
    }

    fn panels(&self) -> Result<Vec<(Panel, &'static dyn PanelHandler)>> {
        self.session
            .data
            .model
            .panels
            .iter()
            .map(|panel| {
                handler_for(&panel.class_name)
                    .map(|handler| (panel.clone(), handler))
                    .ok_or_else(|| InstallerError::UnknownPanel {
                        class: panel.class_name.clone(),
                    })
            })
            .collect()
    }

    fn interactive(&mut self, console: &mut dyn ConsoleIo) -> Result<()> {
        for (panel, handler) in self.panels()? {
            if !is_shown(self.session, &panel)? {
                debug!("skipping panel {}", panel.panel_id());
                continue;
            }
            info!("console panel {}", panel.panel_id());
            loop {
                if !handler.run_console(self.session, &panel, console)? {
                    return Err(InstallerError::Aborted);
                }
                match validate(&self.session.data, &panel) {
                    Ok(()) => break,
                    Err(InstallerError::ValidationFailed { message, .. }) => {
                        let text = self.session.data.message(
                            "console-validation-failed",
                            &message_args([("message", FluentValue::from(message))]),
                        );
                        say(console, &text)?;
                    }
                    Err(err) => return Err(err),
                }
            }
        }
        Ok(())
    }

    fn from_properties(&mut self, properties: &Properties, out: &mut dyn Write) -> Result<()> {
        for (panel, handler) in self.panels()? {
            if !is_shown(self.session, &panel)? {
                debug!("skipping panel {}", panel.panel_id());
                continue;
            }
            handler.run_from_properties(self.session, &panel, properties, out)?;
            validate(&self.session.data, &panel)?;
        }
        Ok(())
    }

    fn generate_properties(&mut self, path: &Utf8Path, console: &mut dyn ConsoleIo) -> Result<()> {
        let mut properties = Properties::new();
        for (panel, handler) in self.panels()? {
            handler.generate_properties(self.session, &panel, &mut properties);
        }
        let info = &self.session.data.model.info;
        let comment = format!("Installation properties for {} {}", info.app_name, info.app_version);
        properties.store(path, Some(comment.as_str()))?;
        let message = self.session.data.message(
            "template-written",
            &message_args([("path", FluentValue::from(path.as_str()))]),
        );
        say(console, &message)
    }
}

/// The system temporary directory.
#[must_use]
pub fn default_lock_dir() -> Utf8PathBuf {
    let temp = std::env::temp_dir();
    Utf8PathBuf::from_path_buf(temp)
        .unwrap_or_else(|path| Utf8PathBuf::from(path.to_string_lossy().into_owned()))
}

#[cfg(test)]
#[path = "console_tests.rs"]
mod tests;
