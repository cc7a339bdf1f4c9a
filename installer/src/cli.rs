//! CLI argument definitions for the installer and uninstaller.
//!
//! The installer accepts the traditional single-dash spellings (`-console`,
//! `-options file`, ...) in any letter case. [`parse_installer_args`]
//! rewrites them to the long options clap understands before parsing, and
//! reports an option that is missing its value the way users of those
//! spellings expect.

use crate::console::ConsoleAction;
use crate::error::{InstallerError, Result};
use camino::Utf8PathBuf;
use clap::Parser;

/// Single-dash options and whether each takes a value.
const LEGACY_OPTIONS: [(&str, bool); 6] = [
    ("console", false),
    ("options", true),
    ("options-template", true),
    ("options-system", false),
    ("options-auto", true),
    ("language", true),
];

/// Run an Instill installer on the console or from recorded answers.
#[derive(Parser, Debug, Default)]
#[command(name = "instill-installer")]
#[command(version, about)]
#[command(long_about = concat!(
    "Run an Instill installer on the console or from recorded answers.\n\n",
    "Without arguments the installer asks its questions on the console. Given ",
    "the path of an automation document, recorded with --record, it replays ",
    "the answers without asking. Answers can also come from a properties file ",
    "or from the environment.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Install interactively:\n",
    "    $ instill-installer\n\n",
    "  Install interactively and record the answers:\n",
    "    $ instill-installer -console --record auto-install.xml\n\n",
    "  Replay recorded answers:\n",
    "    $ instill-installer auto-install.xml\n\n",
    "  Write a properties template, then install from it:\n",
    "    $ instill-installer -options-template install.properties\n",
    "    $ instill-installer -options install.properties\n",
))]
pub struct Cli {
    /// Automation document to replay.
    #[arg(
        value_name = "AUTO_INSTALL_XML",
        conflicts_with_all = ["console", "options", "options_template", "options_system", "options_auto"]
    )]
    pub automation: Option<Utf8PathBuf>,

    /// Ask every question on the console.
    #[arg(long)]
    pub console: bool,

    /// Take the answers from a properties file.
    #[arg(long, value_name = "FILE")]
    pub options: Option<Utf8PathBuf>,

    /// Write a properties template and exit.
    #[arg(long, value_name = "FILE", conflicts_with = "options")]
    pub options_template: Option<Utf8PathBuf>,

    /// Take the answers from the environment.
    #[arg(long, conflicts_with_all = ["options", "options_template"])]
    pub options_system: bool,

    /// Take the answers from a properties file, overridden by the environment.
    #[arg(long, value_name = "FILE", conflicts_with_all = ["options", "options_template", "options_system"])]
    pub options_auto: Option<Utf8PathBuf>,

    /// Language of the installer, as an ISO3 code or locale tag.
    #[arg(long, value_name = "CODE")]
    pub language: Option<String>,

    /// Directory holding volumes and loose packs [default: the artifact's directory].
    #[arg(long, value_name = "DIR")]
    pub media: Option<Utf8PathBuf>,

    /// Installer artifact [default: install.zip beside this program].
    #[arg(long, value_name = "FILE")]
    pub installer: Option<Utf8PathBuf>,

    /// Write an automation document after a successful console installation.
    #[arg(long, value_name = "FILE", conflicts_with = "options_template")]
    pub record: Option<Utf8PathBuf>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(short, long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

/// How the installer runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Console installation.
    Console(ConsoleAction),
    /// Replay of an automation document.
    Automated(Utf8PathBuf),
}

impl Cli {
    /// The mode selected by the flags; no flags means an interactive
    /// console installation.
    #[must_use]
    pub fn mode(&self) -> Mode {
        if let Some(path) = &self.options_template {
            Mode::Console(ConsoleAction::GenerateProperties(path.clone()))
        } else if let Some(path) = &self.options {
            Mode::Console(ConsoleAction::InstallFromProperties(path.clone()))
        } else if let Some(path) = &self.options_auto {
            Mode::Console(ConsoleAction::InstallFromSystemMerge(path.clone()))
        } else if self.options_system {
            Mode::Console(ConsoleAction::InstallFromSystem)
        } else if let Some(path) = &self.automation {
            Mode::Automated(path.clone())
        } else {
            Mode::Console(ConsoleAction::Install)
        }
    }
}

/// Rewrites single-dash options to their long form.
///
/// Matching ignores letter case. Anything that is not a known option is
/// passed through untouched.
///
/// # Errors
///
/// Returns [`InstallerError::MissingArgument`] when an option that takes a
/// value is last or is followed by another option.
pub fn normalise_args<I, S>(args: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();
    let mut normalised = Vec::with_capacity(args.len());
    let mut iter = args.iter().enumerate().peekable();
    while let Some((index, arg)) = iter.next() {
        let Some((name, takes_value)) = legacy_option(arg).filter(|_| index > 0) else {
            normalised.push(arg.clone());
            continue;
        };
        normalised.push(format!("--{name}"));
        if takes_value {
            match iter.next_if(|(_, next)| !next.starts_with('-')) {
                Some((_, value)) => normalised.push(value.clone()),
                None => {
                    return Err(InstallerError::MissingArgument {
                        option: arg.clone(),
                    });
                }
            }
        }
    }
    Ok(normalised)
}

fn legacy_option(arg: &str) -> Option<(&'static str, bool)> {
    let name = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-'))?;
    LEGACY_OPTIONS
        .iter()
        .find(|(option, _)| option.eq_ignore_ascii_case(name))
        .copied()
}

/// Parses installer arguments, including the program name.
///
/// # Errors
///
/// Returns [`InstallerError::MissingArgument`] or [`InstallerError::Usage`].
pub fn parse_installer_args<I, S>(args: I) -> Result<Cli>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Ok(Cli::try_parse_from(normalise_args(args)?)?)
}

/// Remove an application installed by an Instill installer.
#[derive(Parser, Debug, Default)]
#[command(name = "instill-uninstall")]
#[command(version, about)]
pub struct UninstallCli {
    /// Uninstall data written by the installer [default: uninstall.zip beside this program].
    #[arg(long, value_name = "ZIP")]
    pub data: Option<Utf8PathBuf>,

    /// Also delete files the installer did not create.
    #[arg(short, long)]
    pub force: bool,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(short, long = "verbose", action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
