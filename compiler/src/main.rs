//! `instill-compile` entrypoint.
//!
//! Loads configuration, applies command-line overrides and runs the compile
//! pipeline, printing progress and errors to stderr.

use clap::Parser;
use instill_common::logging::init_logger;
use instill_compiler::cli::Cli;
use instill_compiler::config::CompilerConfig;
use instill_compiler::error::Result;
use instill_compiler::pipeline::{compile, write_stderr_line};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbosity);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let config = CompilerConfig::discover(cli.config.as_deref(), &cli.effective_base_dir())?;
    let request = cli.request(config);
    compile(&request, stderr)?;
    Ok(())
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

#[cfg(test)]
mod tests {
    use super::*;
    use instill_compiler::error::CompilerError;

    #[test]
    fn exit_code_for_run_result_returns_zero_on_success() {
        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Ok(()), &mut stderr);
        assert_eq!(exit_code, 0);
        assert!(stderr.is_empty());
    }

    #[test]
    fn exit_code_for_run_result_prints_error_and_returns_one() {
        let err = CompilerError::UnknownDependency {
            pack: String::from("Docs"),
            dependency: String::from("Core"),
        };

        let mut stderr = Vec::new();
        let exit_code = exit_code_for_run_result(Err(err), &mut stderr);
        assert_eq!(exit_code, 1);

        let stderr_text = String::from_utf8(stderr).expect("stderr was not UTF-8");
        assert!(stderr_text.contains("- ERROR - pack Docs depends on unknown pack Core"));
    }

    #[test]
    fn run_reports_missing_descriptions() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("install.xml");
        let cli = Cli::parse_from(["instill-compile", missing.to_str().expect("utf-8"), "-q"]);

        let mut stderr = Vec::new();
        assert!(run(&cli, &mut stderr).is_err());
    }
}
