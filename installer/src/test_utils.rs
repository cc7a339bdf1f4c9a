//! Shared test utilities for the installer crate.
//!
//! Available to unit tests and, through the `test-support` feature, to the
//! behaviour tests under `tests/`.

use crate::console::ConsoleIo;
use crate::dirs::BaseDirs;
use crate::executor::CommandExecutor;
use crate::install_data::InstallData;
use crate::resources::ResourceManager;
use crate::session::Session;
use camino::{Utf8Path, Utf8PathBuf};
use instill_common::i18n::Localiser;
use instill_common::model::{
    Author, CONDITIONS_RESOURCE, Compression, INSTALLATION_RESOURCE, InstallationModel,
    LICENCE_RESOURCE, PACKS_RESOURCE, Pack, PackData, PackFile, PacksInfo, Panel, pack_resource,
};
use sha2::{Digest, Sha256};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{ExitStatus, Output};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute, by full path or file name.
    pub cmd: String,
    /// The arguments to pass, or `None` to accept any.
    pub args: Option<Vec<String>>,
    /// The result to return when this command is invoked.
    pub result: io::Result<Output>,
}

impl ExpectedCall {
    /// Expects `cmd` with exactly `args`.
    #[must_use]
    pub fn new(cmd: impl Into<String>, args: &[&str], result: io::Result<Output>) -> Self {
        Self {
            cmd: cmd.into(),
            args: Some(args.iter().map(|arg| (*arg).to_owned()).collect()),
            result,
        }
    }

    /// Expects `cmd` with any arguments.
    #[must_use]
    pub fn any_args(cmd: impl Into<String>, result: io::Result<Output>) -> Self {
        Self {
            cmd: cmd.into(),
            args: None,
            result,
        }
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Returns predefined results in order and records every invocation so
/// tests can verify command execution without side effects. Commands are
/// compared by their final path component, since installed executables are
/// invoked by absolute path.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
    calls: RefCell<Vec<(String, Vec<String>)>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Invocations seen so far, as command and arguments.
    #[must_use]
    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.borrow().clone()
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        let args: Vec<String> = args.iter().map(|arg| (*arg).to_owned()).collect();
        self.calls.borrow_mut().push((cmd.to_owned(), args.clone()));
        let mut expected = self.expected.borrow_mut();
        let call = expected
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected command invocation: {cmd} {args:?}"));

        let name = std::path::Path::new(cmd)
            .file_name()
            .map_or_else(|| cmd.to_owned(), |name| name.to_string_lossy().into_owned());
        assert!(call.cmd == cmd || call.cmd == name, "expected {}, got {cmd}", call.cmd);
        if let Some(expected_args) = &call.args {
            assert_eq!(expected_args, &args);
        }

        call.result
    }
}

/// A console fed from a list of answers, recording everything shown.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    answers: VecDeque<String>,
    transcript: String,
}

impl ScriptedConsole {
    /// Console answering prompts with `answers` in order, then end of input.
    #[must_use]
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            transcript: String::new(),
        }
    }

    /// Everything printed and prompted so far.
    #[must_use]
    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Answers not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl ConsoleIo for ScriptedConsole {
    fn print(&mut self, text: &str) -> io::Result<()> {
        self.transcript.push_str(text);
        self.transcript.push('\n');
        Ok(())
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.transcript.push_str(prompt);
        let answer = self.answers.pop_front();
        if let Some(answer) = &answer {
            self.transcript.push_str(answer);
        }
        self.transcript.push('\n');
        Ok(answer)
    }
}

/// [`BaseDirs`] answering with fixed paths.
#[derive(Clone, Debug, Default)]
pub struct FixedDirs {
    /// Reported home directory.
    pub home: Option<PathBuf>,
    /// Reported temporary directory.
    pub temp: PathBuf,
}

impl BaseDirs for FixedDirs {
    fn home_dir(&self) -> Option<PathBuf> {
        self.home.clone()
    }

    fn temp_dir(&self) -> PathBuf {
        self.temp.clone()
    }
}

/// A two-pack installation of "Demo" 1.0 showing `panels` in order.
///
/// `Core` is required; `Docs` is optional and not preselected.
#[must_use]
pub fn demo_model(panels: &[&str]) -> InstallationModel {
    let mut model = InstallationModel::default();
    model.info.app_name = "Demo".to_owned();
    model.info.app_version = "1.0".to_owned();
    model.info.app_url = Some("https://demo.example.org".to_owned());
    model.info.authors.push(Author {
        name: "Ada".to_owned(),
        email: Some("ada@example.org".to_owned()),
    });
    model.locales.push("eng".to_owned());
    model.packs.push(Pack {
        name: "Core".to_owned(),
        description: "The application".to_owned(),
        required: true,
        preselected: true,
        uninstall: true,
        ..Pack::default()
    });
    model.packs.push(Pack {
        name: "Docs".to_owned(),
        description: "The manual".to_owned(),
        uninstall: true,
        ..Pack::default()
    });
    model.panels = panels.iter().map(|class| Panel::new(*class)).collect();
    model
}

/// Writes single-volume installer artifacts with stored packs.
///
/// Files added with [`ArtifactBuilder::file`] are appended to the pack's
/// file list with their digest and position filled in, targeting
/// `$INSTALL_PATH/<path>`.
#[derive(Clone, Debug)]
pub struct ArtifactBuilder {
    model: InstallationModel,
    payloads: Vec<Vec<u8>>,
    licence: Option<String>,
    conditions: Option<String>,
}

impl ArtifactBuilder {
    /// Builder for `model`; its packs start with the files they already list.
    #[must_use]
    pub fn new(model: InstallationModel) -> Self {
        let payloads = vec![Vec::new(); model.packs.len()];
        Self {
            model,
            payloads,
            licence: None,
            conditions: None,
        }
    }

    /// Adds a file holding `content` to pack `pack`.
    ///
    /// # Panics
    ///
    /// Panics when the model has no pack at that index.
    #[must_use]
    #[expect(
        clippy::indexing_slicing,
        reason = "a missing pack is a mistake in the calling test"
    )]
    pub fn file(mut self, pack: usize, path: &str, content: &str) -> Self {
        let payload = &mut self.payloads[pack];
        let entry = PackFile {
            source: path.to_owned(),
            target: format!("$INSTALL_PATH/{path}"),
            size: content.len() as u64,
            sha256: format!("{:x}", Sha256::digest(content.as_bytes())),
            position: payload.len() as u64,
            ..PackFile::default()
        };
        payload.extend_from_slice(content.as_bytes());
        let pack = &mut self.model.packs[pack];
        pack.size = payload.len() as u64;
        pack.files.push(entry);
        self
    }

    /// Bundles a licence text.
    #[must_use]
    pub fn licence(mut self, text: &str) -> Self {
        self.model.has_licence = true;
        self.licence = Some(text.to_owned());
        self
    }

    /// Bundles a `<conditions>` element.
    #[must_use]
    pub fn conditions(mut self, xml: &str) -> Self {
        self.conditions = Some(xml.to_owned());
        self
    }

    /// The model as it will be written.
    #[must_use]
    pub const fn model(&self) -> &InstallationModel {
        &self.model
    }

    /// Writes the artifact to `path`.
    ///
    /// # Panics
    ///
    /// Panics when the file cannot be written.
    #[expect(
        clippy::expect_used,
        reason = "an unwritable artifact means the test cannot run"
    )]
    pub fn write(&self, path: &Utf8Path) {
        let file = File::create(path).expect("create artifact");
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();
        let model = serde_json::to_vec(&self.model).expect("serialise model");
        zip.start_file(INSTALLATION_RESOURCE, options).expect("model entry");
        zip.write_all(&model).expect("write model");

        let info = PacksInfo {
            packs: self
                .model
                .packs
                .iter()
                .zip(&self.payloads)
                .map(|(pack, payload)| PackData {
                    name: pack.name.clone(),
                    compression: Compression::None,
                    stream_offset: 0,
                    stream_len: payload.len() as u64,
                })
                .collect(),
        };
        zip.start_file(PACKS_RESOURCE, options).expect("packs entry");
        zip.write_all(&serde_json::to_vec(&info).expect("serialise packs"))
            .expect("write packs");
        for (index, payload) in self.payloads.iter().enumerate() {
            zip.start_file(pack_resource(index), options).expect("pack entry");
            zip.write_all(payload).expect("write pack");
        }
        if let Some(licence) = &self.licence {
            zip.start_file(LICENCE_RESOURCE, options).expect("licence entry");
            zip.write_all(licence.as_bytes()).expect("write licence");
        }
        if let Some(conditions) = &self.conditions {
            zip.start_file(CONDITIONS_RESOURCE, options).expect("conditions entry");
            zip.write_all(conditions.as_bytes()).expect("write conditions");
        }
        zip.finish().expect("finish artifact");
    }
}

/// A written artifact in a temporary directory, with an empty executor.
///
/// The directory holds `install.zip`, a `home` directory reported as the
/// user's home, and `target`, the installation directory sessions start
/// with. The directory itself serves as the lock directory.
#[derive(Debug)]
pub struct InstallerFixture {
    _dir: TempDir,
    /// The temporary directory.
    pub root: Utf8PathBuf,
    /// The artifact.
    pub artifact: Utf8PathBuf,
    /// The installation directory sessions start with.
    pub target: Utf8PathBuf,
    dirs: FixedDirs,
    executor: StubExecutor,
}

impl InstallerFixture {
    /// Writes `builder`'s artifact into a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics when the directory cannot be prepared.
    #[must_use]
    #[expect(
        clippy::expect_used,
        reason = "a fixture that cannot be prepared means the test cannot run"
    )]
    pub fn new(builder: &ArtifactBuilder) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 tempdir");
        let home = root.join("home");
        std::fs::create_dir_all(&home).expect("home dir");
        let artifact = root.join("install.zip");
        builder.write(&artifact);
        let dirs = FixedDirs {
            home: Some(home.into_std_path_buf()),
            temp: root.clone().into_std_path_buf(),
        };
        Self {
            _dir: dir,
            target: root.join("target"),
            artifact,
            root,
            dirs,
            executor: StubExecutor::new(Vec::new()),
        }
    }

    /// Directories reporting the fixture's home and temporary directory.
    #[must_use]
    pub const fn dirs(&self) -> &FixedDirs {
        &self.dirs
    }

    /// Executor expecting no commands.
    #[must_use]
    pub const fn executor(&self) -> &StubExecutor {
        &self.executor
    }

    /// A British English session installing into [`Self::target`].
    ///
    /// # Panics
    ///
    /// Panics when the artifact cannot be loaded.
    #[must_use]
    #[expect(
        clippy::expect_used,
        reason = "an unreadable fixture artifact means the test cannot run"
    )]
    pub fn session(&self) -> Session<'_> {
        let mut resources = ResourceManager::open(self.artifact.clone()).expect("open artifact");
        let model = resources.model().expect("artifact model");
        let localiser = Localiser::new(Some("en-GB"));
        let mut data = InstallData::load(&mut resources, model, localiser, &self.dirs)
            .expect("install data");
        data.set_install_path(self.target.as_str());
        Session::new(data, resources, &self.executor)
    }
}
