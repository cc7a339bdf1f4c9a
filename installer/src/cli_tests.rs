//! Tests for installer CLI parsing and mode selection.

use super::*;
use rstest::rstest;

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["instill-installer"];
    argv.extend_from_slice(args);
    parse_installer_args(argv).expect("arguments should parse")
}

#[test]
fn no_arguments_run_an_interactive_console_install() {
    let cli = parse(&[]);
    assert_eq!(cli.mode(), Mode::Console(ConsoleAction::Install));
    assert!(cli.language.is_none());
    assert!(cli.record.is_none());
    assert_eq!(cli.verbosity, 0);
}

#[test]
fn a_positional_path_is_replayed() {
    let cli = parse(&["auto-install.xml"]);
    assert_eq!(
        cli.mode(),
        Mode::Automated(Utf8PathBuf::from("auto-install.xml"))
    );
}

#[rstest]
#[case::lower(&["-console"])]
#[case::upper(&["-CONSOLE"])]
#[case::mixed(&["-Console"])]
#[case::long(&["--console"])]
fn console_flag_ignores_case(#[case] args: &[&str]) {
    let cli = parse(args);
    assert!(cli.console);
    assert_eq!(cli.mode(), Mode::Console(ConsoleAction::Install));
}

#[rstest]
#[case::options(
    &["-options", "answers.properties"],
    ConsoleAction::InstallFromProperties(Utf8PathBuf::from("answers.properties"))
)]
#[case::template(
    &["-OPTIONS-TEMPLATE", "template.properties"],
    ConsoleAction::GenerateProperties(Utf8PathBuf::from("template.properties"))
)]
#[case::system(&["-options-system"], ConsoleAction::InstallFromSystem)]
#[case::auto(
    &["-Options-Auto", "base.properties"],
    ConsoleAction::InstallFromSystemMerge(Utf8PathBuf::from("base.properties"))
)]
fn properties_options_select_their_action(#[case] args: &[&str], #[case] expected: ConsoleAction) {
    assert_eq!(parse(args).mode(), Mode::Console(expected));
}

#[test]
fn language_takes_a_value() {
    let cli = parse(&["-language", "fra", "-console"]);
    assert_eq!(cli.language.as_deref(), Some("fra"));
}

#[rstest]
#[case::last(&["-options"], "-options")]
#[case::followed_by_option(&["-options", "-console"], "-options")]
#[case::language(&["-LANGUAGE"], "-LANGUAGE")]
fn options_missing_their_value_are_reported(#[case] args: &[&str], #[case] option: &str) {
    let mut argv = vec!["instill-installer"];
    argv.extend_from_slice(args);
    let err = parse_installer_args(argv).expect_err("a value is missing");
    assert_eq!(err.to_string(), format!("Option \"{option}\" requires an argument!"));
}

#[test]
fn normalising_leaves_unknown_arguments_alone() {
    let args = normalise_args(["instill-installer", "-v", "setup.xml", "--media", "/mnt/cd"])
        .expect("nothing to rewrite");
    assert_eq!(
        args,
        vec!["instill-installer", "-v", "setup.xml", "--media", "/mnt/cd"]
    );
}

#[test]
fn the_program_name_is_never_rewritten() {
    let args = normalise_args(["-console"]).expect("program name only");
    assert_eq!(args, vec!["-console"]);
}

#[test]
fn automation_conflicts_with_console_modes() {
    let err = parse_installer_args(["instill-installer", "-console", "auto.xml"])
        .expect_err("conflicting modes");
    assert!(matches!(err, InstallerError::Usage(_)));
}

#[test]
fn runtime_options_are_parsed() {
    let cli = parse(&[
        "--installer",
        "/media/install.zip",
        "--media",
        "/media",
        "--record",
        "answers.xml",
        "-vv",
    ]);
    assert_eq!(cli.installer, Some(Utf8PathBuf::from("/media/install.zip")));
    assert_eq!(cli.media, Some(Utf8PathBuf::from("/media")));
    assert_eq!(cli.record, Some(Utf8PathBuf::from("answers.xml")));
    assert_eq!(cli.verbosity, 2);
}

#[test]
fn uninstall_cli_defaults() {
    let cli = UninstallCli::parse_from(["instill-uninstall"]);
    assert!(cli.data.is_none());
    assert!(!cli.force);
}

#[test]
fn uninstall_cli_parses_data_and_force() {
    let cli = UninstallCli::parse_from(["instill-uninstall", "--data", "/opt/demo/Uninstaller/uninstall.zip", "-f"]);
    assert_eq!(
        cli.data,
        Some(Utf8PathBuf::from("/opt/demo/Uninstaller/uninstall.zip"))
    );
    assert!(cli.force);
}
