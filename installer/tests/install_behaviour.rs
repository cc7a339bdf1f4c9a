//! End-to-end behaviour tests for `instill-installer` and `instill-uninstall`.
//!
//! Each scenario compiles the compiler's demo project into a temporary
//! directory and runs the binaries against the artifact with the home and
//! temporary directories redirected into the same place.

use camino::{Utf8Path, Utf8PathBuf};
use instill_compiler::config::CompilerConfig;
use instill_compiler::pipeline::{CompileRequest, compile};
use instill_installer::properties::Properties;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

#[derive(Default)]
struct InstallWorld {
    _temp_dir: Option<TempDir>,
    root: Option<Utf8PathBuf>,
    target: Option<Utf8PathBuf>,
    automation: Option<Utf8PathBuf>,
    stdin: String,
    output: Option<Output>,
}

impl InstallWorld {
    fn root(&self) -> &Utf8Path {
        self.root.as_deref().expect("installer compiled")
    }

    fn artifact(&self) -> Utf8PathBuf {
        self.root().join("install.zip")
    }

    fn target(&self) -> Utf8PathBuf {
        self.target
            .clone()
            .unwrap_or_else(|| self.root().join("home/demo"))
    }

    fn output(&self) -> &Output {
        self.output.as_ref().expect("a binary has run")
    }

    fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output().stdout).into_owned()
    }

    fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output().stderr).into_owned()
    }

    fn run(&mut self, program: &str, args: &[String]) {
        let root = self.root().to_owned();
        let mut child = Command::new(program)
            .args(args)
            .current_dir(&root)
            .env("HOME", root.join("home"))
            .env("TMPDIR", &root)
            .env_remove("INSTILL_LOCALE")
            .env_remove("RUST_LOG")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .unwrap_or_else(|err| panic!("failed to run {program}: {err}"));
        child
            .stdin
            .take()
            .expect("piped stdin")
            .write_all(self.stdin.as_bytes())
            .expect("write answers");
        self.output = Some(child.wait_with_output().expect("wait for binary"));
    }

    fn run_installer(&mut self, extra: Vec<String>) {
        let mut args = vec![String::from("--installer"), self.artifact().into_string()];
        args.extend(extra);
        self.run(env!("CARGO_BIN_EXE_instill-installer"), &args);
    }
}

#[fixture]
fn world() -> InstallWorld {
    InstallWorld::default()
}

fn demo_project() -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("../compiler/tests/fixtures/demo")
}

fn compile_demo(world: &mut InstallWorld, descriptor: Option<String>) {
    let temp_dir = tempfile::tempdir().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(temp_dir.path().to_path_buf()).expect("utf-8 path");
    std::fs::create_dir_all(root.join("home")).expect("home dir");
    let project = demo_project();
    let descriptor = match descriptor {
        Some(source) => {
            let path = root.join("install.xml");
            std::fs::write(&path, source).expect("write description");
            path
        }
        None => project.join("install.xml"),
    };
    let request = CompileRequest {
        descriptor,
        base_dir: project,
        output: root.join("install.zip"),
        config: CompilerConfig::default(),
        quiet: true,
    };
    compile(&request, &mut Vec::new()).expect("demo project compiles");
    world.root = Some(root);
    world._temp_dir = Some(temp_dir);
}

fn write_automation(world: &mut InstallWorld, dir: &str, packs: &str) {
    let target = world.root().join(dir);
    let path = world.root().join("auto-install.xml");
    std::fs::write(
        &path,
        format!(
            r#"<AutomatedInstallation langpack="eng">
  <HelloPanel/>
  <LicencePanel/>
  <TargetPanel><installpath>{target}</installpath></TargetPanel>
  <PacksPanel>{packs}</PacksPanel>
  <InstallPanel/>
  <FinishPanel/>
</AutomatedInstallation>
"#
        ),
    )
    .expect("write automation document");
    world.target = Some(target);
    world.automation = Some(path);
}

#[given("the demo installer")]
fn given_demo_installer(world: &mut InstallWorld) {
    compile_demo(world, None);
}

#[given("the demo installer with the Docs pack behind an optional guard")]
fn given_optional_docs_guard(world: &mut InstallWorld) {
    let source =
        std::fs::read_to_string(demo_project().join("install.xml")).expect("read description");
    let source = source
        .replacen(r#" condition="docs.wanted""#, "", 1)
        .replacen(
            "  </conditions>",
            "    <packcondition packid=\"docs\" conditionid=\"docs.wanted\" optional=\"true\"/>\n  </conditions>",
            1,
        );
    assert!(source.contains("<packcondition"), "description lacks a conditions block");
    compile_demo(world, Some(source));
}

#[given("an automation document installing into \"{dir}\"")]
fn given_automation(world: &mut InstallWorld, dir: String) {
    write_automation(world, &dir, r#"<pack index="0" name="Core" selected="true"/>"#);
}

#[given("an automation document selecting the Docs pack into \"{dir}\"")]
fn given_automation_with_docs(world: &mut InstallWorld, dir: String) {
    write_automation(
        world,
        &dir,
        r#"<pack index="0" name="Core" selected="true"/><pack index="1" name="Docs" selected="true"/>"#,
    );
}

#[given("a properties file installing into \"{dir}\"")]
fn given_properties(world: &mut InstallWorld, dir: String) {
    let target = world.root().join(dir);
    let properties: Properties = [("INSTALL_PATH", target.as_str())].into_iter().collect();
    properties
        .store(&world.root().join("answers.properties"), None)
        .expect("write properties");
    world.target = Some(target);
}

#[given("console answers \"{answers}\"")]
fn given_console_answers(world: &mut InstallWorld, answers: String) {
    world.stdin = answers
        .split(',')
        .map(|answer| format!("{}\n", answer.trim()))
        .collect();
}

#[when("the installer is run with the automation document")]
fn when_installer_replays(world: &mut InstallWorld) {
    let automation = world.automation.clone().expect("automation document written");
    world.run_installer(vec![automation.into_string()]);
}

#[when("the installer is run with \"{args}\"")]
fn when_installer_run_with(world: &mut InstallWorld, args: String) {
    world.run_installer(args.split_whitespace().map(str::to_owned).collect());
}

#[when("the uninstaller is run")]
fn when_uninstaller_run(world: &mut InstallWorld) {
    let data = world.target().join("uninstaller/uninstall.zip");
    world.run(
        env!("CARGO_BIN_EXE_instill-uninstall"),
        &[String::from("--data"), data.into_string()],
    );
}

#[then("the installer exits successfully")]
fn then_installer_success(world: &mut InstallWorld) {
    assert!(
        world.output().status.success(),
        "expected success\nstdout: {}\nstderr: {}",
        world.stdout(),
        world.stderr()
    );
}

#[then("the uninstaller exits successfully")]
fn then_uninstaller_success(world: &mut InstallWorld) {
    assert!(
        world.output().status.success(),
        "expected success\nstdout: {}\nstderr: {}",
        world.stdout(),
        world.stderr()
    );
    assert!(world.stdout().contains("Uninstallation finished."));
}

#[then("the installer fails")]
fn then_installer_fails(world: &mut InstallWorld) {
    assert_eq!(world.output().status.code(), Some(1), "stderr: {}", world.stderr());
}

#[then("the output contains \"{text}\"")]
fn then_output_contains(world: &mut InstallWorld, text: String) {
    let stdout = world.stdout();
    assert!(stdout.contains(&text), "stdout: {stdout}");
}

#[then("the error output reports that \"{option}\" requires an argument")]
fn then_missing_argument(world: &mut InstallWorld, option: String) {
    let stderr = world.stderr();
    let expected = format!("- ERROR - Option \"{option}\" requires an argument!");
    assert!(stderr.contains(&expected), "stderr: {stderr}");
}

#[then("the launcher script names the installation directory")]
fn then_launcher_substituted(world: &mut InstallWorld) {
    let script = std::fs::read_to_string(world.target().join("bin/demo.sh")).expect("script");
    assert!(script.contains(&format!("\"{}/lib/demo.jar\"", world.target())));
    assert!(!script.contains("%{INSTALL_PATH}"));
    assert!(world.target().join("lib/demo.jar").is_file());
    assert!(!world.target().join("docs").exists());
}

#[then("the manual is installed")]
fn then_manual_installed(world: &mut InstallWorld) {
    assert!(world.target().join("docs/manual.txt").is_file());
}

#[then("an uninstaller is written")]
fn then_uninstaller_written(world: &mut InstallWorld) {
    assert!(world.target().join("uninstaller/uninstall.zip").is_file());
}

#[then("the template sets \"{key}\"")]
fn then_template_sets(world: &mut InstallWorld, key: String) {
    let template = Properties::load(&world.root().join("template.properties")).expect("template");
    assert!(template.contains(&key), "template lacks {key}");
}

#[then("nothing is installed")]
fn then_nothing_installed(world: &mut InstallWorld) {
    assert!(!world.target().exists());
}

#[then("the installed files are gone")]
fn then_files_gone(world: &mut InstallWorld) {
    assert!(!world.target().join("bin/demo.sh").exists());
    assert!(!world.target().join("lib/demo.jar").exists());
    assert!(!world.target().join("uninstaller/uninstall.zip").exists());
}

#[scenario(
    path = "tests/features/install.feature",
    name = "An automation document installs the application"
)]
fn scenario_automated(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "A properties template lists the answers"
)]
fn scenario_template(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "A properties installation is removed by the uninstaller"
)]
fn scenario_properties_and_uninstall(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "Rejecting the licence on the console stops the installation"
)]
fn scenario_licence_rejected(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "An option without its value is reported"
)]
fn scenario_missing_option_value(world: InstallWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/install.feature",
    name = "A pack behind a false optional guard can still be installed"
)]
fn scenario_optional_pack_guard(world: InstallWorld) {
    let _ = world;
}
