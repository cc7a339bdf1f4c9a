//! `instill-uninstall` entrypoint.
//!
//! Reads the `uninstall.zip` an installation left behind and removes what
//! it lists. Exits with status 1 when anything could not be removed.

use clap::Parser;
use instill_common::i18n::{FluentValue, resolve_localiser_from_env};
use instill_common::logging::init_logger;
use instill_installer::cli::UninstallCli;
use instill_installer::error::Result;
use instill_installer::executor::SystemCommandExecutor;
use instill_installer::install_data::message_args;
use instill_installer::launch::beside_current_exe;
use instill_installer::uninstall::{Destroyer, UNINSTALL_ARCHIVE, UninstallArchive};
use std::io::Write;

fn main() {
    let cli = UninstallCli::parse();
    init_logger(cli.verbosity);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let exit_code = match run(&cli, &mut stdout) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            if writeln!(stderr, "- ERROR - {err}").is_err() {
                log::warn!("could not write to stderr: {err}");
            }
            1
        }
    };
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Removes the installation; `Ok(false)` when some paths remain.
fn run(cli: &UninstallCli, out: &mut dyn Write) -> Result<bool> {
    let selection = resolve_localiser_from_env(None, None);
    selection.log_outcome("instill_uninstall");
    let localiser = selection.into_localiser();

    let data = match &cli.data {
        Some(path) => path.clone(),
        None => beside_current_exe(UNINSTALL_ARCHIVE)?,
    };
    let archive = UninstallArchive::open(&data)?;
    let start = localiser.text(
        "uninstall-start",
        &message_args([("path", FluentValue::from(archive.log.install_path.as_str()))]),
    );
    write_line(out, &start);

    let executor = SystemCommandExecutor::default();
    let report = Destroyer::new(&executor).force(cli.force).destroy(&archive)?;
    if report.is_complete() {
        write_line(out, &localiser.text("uninstall-done", &message_args([])));
        return Ok(true);
    }
    let failed = localiser.text(
        "uninstall-failed-paths",
        &message_args([("count", FluentValue::from(report.failed.len()))]),
    );
    write_line(out, &failed);
    for path in &report.failed {
        write_line(out, &format!("  {path}"));
    }
    Ok(false)
}

fn write_line(out: &mut dyn Write, line: &str) {
    if writeln!(out, "{line}").is_err() {
        log::warn!("could not write to stdout: {line}");
    }
}
