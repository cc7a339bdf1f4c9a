//! Compiles the demo project, replays an automated installation through
//! the library launcher and removes it again.

use camino::{Utf8Path, Utf8PathBuf};
use instill::compiler::config::CompilerConfig;
use instill::compiler::pipeline::{CompileRequest, compile};
use instill::installer::cli::parse_installer_args;
use instill::installer::launch::{Launcher, launch};
use instill::installer::properties::Properties;
use instill::installer::test_utils::{FixedDirs, ScriptedConsole, StubExecutor};
use instill::installer::uninstall::{Destroyer, UNINSTALL_ARCHIVE, UninstallArchive};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn artifact(&self) -> Utf8PathBuf {
        self.root.join("install.zip")
    }

    fn dirs(&self) -> FixedDirs {
        FixedDirs {
            home: Some(self.root.join("home").into_std_path_buf()),
            temp: self.root.clone().into_std_path_buf(),
        }
    }
}

#[fixture]
#[expect(clippy::expect_used, reason = "fixture setup fails the test on error")]
fn workspace() -> Workspace {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp dir");
    std::fs::create_dir_all(root.join("home")).expect("home dir");
    let project = Utf8Path::new(env!("CARGO_MANIFEST_DIR")).join("compiler/tests/fixtures/demo");
    let request = CompileRequest {
        descriptor: project.join("install.xml"),
        base_dir: project,
        output: root.join("install.zip"),
        config: CompilerConfig::default(),
        quiet: true,
    };
    compile(&request, &mut Vec::new()).expect("demo project compiles");
    Workspace { _dir: dir, root }
}

#[expect(clippy::expect_used, reason = "test helper")]
fn automation(workspace: &Workspace, target: &Utf8Path) -> Utf8PathBuf {
    let path = workspace.root.join("auto-install.xml");
    std::fs::write(
        &path,
        format!(
            r#"<AutomatedInstallation langpack="eng">
  <HelloPanel/>
  <LicencePanel/>
  <TargetPanel><installpath>{target}</installpath></TargetPanel>
  <PacksPanel><pack index="0" name="Core" selected="true"/></PacksPanel>
  <InstallPanel/>
  <FinishPanel/>
</AutomatedInstallation>
"#
        ),
    )
    .expect("write automation document");
    path
}

#[rstest]
#[expect(clippy::expect_used, reason = "test assertions")]
fn an_installation_round_trips(workspace: Workspace) {
    let target = workspace.root.join("apps/demo");
    let document = automation(&workspace, &target);
    let cli = parse_installer_args([
        "instill-installer",
        "--installer",
        workspace.artifact().as_str(),
        document.as_str(),
    ])
    .expect("arguments parse");
    let dirs = workspace.dirs();
    let executor = StubExecutor::new(Vec::new());
    let launcher = Launcher::new(&dirs, &executor);
    let mut console = ScriptedConsole::new(Vec::<String>::new());
    let mut out = Vec::new();

    launch(&cli, &launcher, &mut console, &mut out).expect("installation succeeds");

    let script = std::fs::read_to_string(target.join("bin/demo.sh")).expect("launcher script");
    assert!(script.contains(&format!("{target}/lib/demo.jar")));
    assert!(target.join("lib/demo.jar").is_file());
    assert!(!target.join("docs").exists());

    let data = target.join("uninstaller").join(UNINSTALL_ARCHIVE);
    let archive = UninstallArchive::open(&data).expect("uninstall data");
    assert_eq!(archive.log.install_path, target.as_str());

    let report = Destroyer::new(&executor).destroy(&archive).expect("uninstall runs");

    assert!(report.is_complete(), "left behind: {:?}", report.failed);
    assert!(!target.join("bin/demo.sh").exists());
    assert!(!target.join("lib/demo.jar").exists());
    executor.assert_finished();
}

#[rstest]
#[expect(clippy::expect_used, reason = "test assertions")]
fn the_template_proposes_a_target_under_the_home_directory(workspace: Workspace) {
    let template = workspace.root.join("template.properties");
    let cli = parse_installer_args([
        "instill-installer",
        "--installer",
        workspace.artifact().as_str(),
        "-options-template",
        template.as_str(),
    ])
    .expect("arguments parse");
    let dirs = workspace.dirs();
    let executor = StubExecutor::new(Vec::new());
    let launcher = Launcher::new(&dirs, &executor);
    let mut console = ScriptedConsole::new(Vec::<String>::new());

    launch(&cli, &launcher, &mut console, &mut Vec::new()).expect("template written");

    let properties = Properties::load(&template).expect("template readable");
    let expected = workspace.root.join("home/demo");
    assert_eq!(properties.get("INSTALL_PATH"), Some(expected.as_str()));
    assert!(!expected.exists());
}
