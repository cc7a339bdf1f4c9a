//! `instill-installer` entrypoint.
//!
//! Runs the installer artifact beside the program (or the one given with
//! `--installer`) on the console, from a properties file or the
//! environment, or by replaying an automation document.

use instill_common::logging::init_logger;
use instill_installer::cli::parse_installer_args;
use instill_installer::console::StdConsole;
use instill_installer::dirs::SystemBaseDirs;
use instill_installer::error::{InstallerError, Result};
use instill_installer::executor::SystemCommandExecutor;
use instill_installer::launch::{Launcher, launch};
use std::io::Write;

fn main() {
    let mut stderr = std::io::stderr();
    let cli = match parse_installer_args(std::env::args()) {
        Ok(cli) => cli,
        Err(InstallerError::Usage(err)) => err.exit(),
        Err(err) => std::process::exit(exit_code_for_run_result(Err(err), &mut stderr)),
    };
    init_logger(cli.verbosity);

    let dirs = SystemBaseDirs::new();
    let executor = SystemCommandExecutor::default();
    let launcher = Launcher::new(&dirs, &executor);
    let mut console = StdConsole::stdio();
    let mut stdout = std::io::stdout();
    let run_result = launch(&cli, &launcher, &mut console, &mut stdout);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("- ERROR - {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        log::warn!("could not write to stderr: {message}");
    }
}
