//! Installs the selected packs.
//!
//! Pack data is read in one of three ways: from a per-pack artifact entry,
//! from the gzip stream spread over a volume set, or, for loose packs, from
//! the source files lying next to the installer. Files are located by the
//! position the compiler recorded, verified against their size and digest,
//! and moved into place atomically.

mod stream;
mod target;

pub use target::resolve_target;

use crate::error::{InstallerError, Result};
use crate::executor::{CommandExecutor, describe_failure};
use crate::install_data::{InstallData, message_args};
use crate::resources::ResourceManager;
use crate::uninstall::{UninstallData, UninstallExecutable};
use camino::{Utf8Path, Utf8PathBuf};
use instill_common::i18n::{FluentValue, Localiser};
use instill_common::model::{
    ExecutionStage, FailurePolicy, OverridePolicy, Pack, PackFile, pack_resource,
};
use instill_common::spanning::SpanningReader;
use instill_common::substitutor::VariableSubstitutor;
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use stream::{Positioned, decode};

/// Receives progress and answers overwrite questions during unpacking.
pub trait UnpackListener {
    /// Pack `current` of `total` is about to be installed.
    fn pack_started(&mut self, pack: &Pack, current: usize, total: usize);

    /// Whether to overwrite `path`; `default` is the policy's suggestion.
    fn ask_overwrite(&mut self, path: &Utf8Path, default: bool) -> bool;
}

/// Listener writing localised progress lines and accepting every default.
pub struct WriterListener<'w> {
    out: &'w mut dyn Write,
    localiser: &'w Localiser,
}

impl<'w> WriterListener<'w> {
    /// Listener writing to `out`.
    pub fn new(out: &'w mut dyn Write, localiser: &'w Localiser) -> Self {
        Self { out, localiser }
    }
}

impl UnpackListener for WriterListener<'_> {
    fn pack_started(&mut self, pack: &Pack, current: usize, total: usize) {
        let line = progress_message(self.localiser, pack, current, total);
        if let Err(err) = writeln!(self.out, "{line}") {
            debug!("progress output failed: {err}");
        }
    }

    fn ask_overwrite(&mut self, path: &Utf8Path, default: bool) -> bool {
        debug!("{path} exists; {}", if default { "overwriting" } else { "keeping it" });
        default
    }
}

/// The localised progress line for a pack.
#[must_use]
pub fn progress_message(
    localiser: &Localiser,
    pack: &Pack,
    current: usize,
    total: usize,
) -> String {
    let args = message_args([
        ("pack", FluentValue::from(pack.name.as_str())),
        ("current", FluentValue::from(current)),
        ("total", FluentValue::from(total)),
    ]);
    localiser.text("install-pack-progress", &args)
}

/// Totals for one unpacking run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnpackSummary {
    /// Packs installed.
    pub packs: usize,
    /// Files written.
    pub files: usize,
    /// Files left alone: inactive on this system or kept by their policy.
    pub skipped: usize,
    /// Bytes written.
    pub bytes: u64,
}

/// Installs the selected packs of an [`InstallData`].
pub struct Unpacker<'a> {
    data: &'a InstallData,
    executor: &'a dyn CommandExecutor,
    media_dir: Utf8PathBuf,
}

impl<'a> Unpacker<'a> {
    /// Unpacker reading volumes and loose packs from `media_dir`.
    pub fn new(
        data: &'a InstallData,
        executor: &'a dyn CommandExecutor,
        media_dir: impl Into<Utf8PathBuf>,
    ) -> Self {
        Self {
            data,
            executor,
            media_dir: media_dir.into(),
        }
    }

    /// Installs every selected pack in model order, then runs post-install
    /// executables.
    ///
    /// # Errors
    ///
    /// Fails on unreadable pack data, targets outside the installation
    /// directory, size or digest mismatches, write failures, and
    /// post-install executables whose policy is to abort.
    pub fn unpack(
        &self,
        resources: &mut ResourceManager,
        listener: &mut dyn UnpackListener,
        uninstall: &mut UninstallData,
    ) -> Result<UnpackSummary> {
        let packs_info = resources.packs_info()?;
        let selected: Vec<(usize, &Pack)> = self.data.selected_packs().collect();
        let needs_volumes = selected.iter().any(|(_, pack)| !pack.loose);
        let mut volumes = if self.data.model.multi_volume && needs_volumes {
            Some(self.open_volumes(resources)?)
        } else {
            None
        };

        let mut summary = UnpackSummary::default();
        let total = selected.len();
        for (current, (index, pack)) in selected.iter().enumerate() {
            listener.pack_started(pack, current + 1, total);
            let layout = packs_info
                .packs
                .get(*index)
                .ok_or_else(|| InstallerError::MissingResource {
                    name: pack_resource(*index),
                })?;
            if pack.loose {
                self.unpack_loose(pack, listener, uninstall, &mut summary)?;
            } else if let Some(stream) = volumes.as_mut() {
                let offset = layout.stream_offset;
                self.unpack_stream(pack, offset, stream, listener, uninstall, &mut summary)?;
            } else {
                let name = pack_resource(*index);
                let entry = resources.stream(&name)?;
                let decoded = decode(entry, layout.compression)
                    .map_err(|err| InstallerError::io(name.as_str(), err))?;
                let mut stream = Positioned::new(decoded);
                self.unpack_stream(pack, 0, &mut stream, listener, uninstall, &mut summary)?;
            }
            self.apply_parsables(pack)?;
            self.register_executables(pack, uninstall)?;
            summary.packs += 1;
            info!("installed pack {}", pack.name);
        }

        for (_, pack) in &selected {
            self.run_post_install(pack)?;
        }
        Ok(summary)
    }

    fn open_volumes(&self, resources: &mut ResourceManager) -> Result<Positioned<Box<dyn Read>>> {
        let info = resources.volumes_info()?;
        let base = self.media_dir.join(&info.first_volume);
        debug!("reading {} volume(s) from {base}", info.volume_count);
        let reader = SpanningReader::open(base, info.volume_count)?;
        Ok(Positioned::new(Box::new(flate2::read::GzDecoder::new(reader))))
    }

    fn unpack_stream<R: Read>(
        &self,
        pack: &Pack,
        offset: u64,
        stream: &mut Positioned<R>,
        listener: &mut dyn UnpackListener,
        uninstall: &mut UninstallData,
        summary: &mut UnpackSummary,
    ) -> Result<()> {
        for file in &pack.files {
            let Some(target) = self.prepare(pack, file, listener, uninstall, summary)? else {
                continue;
            };
            stream
                .seek_to(offset + file.position)
                .map_err(|err| InstallerError::io(&target, err))?;
            self.write_file(pack, file, &target, stream, uninstall, summary)?;
        }
        Ok(())
    }

    fn unpack_loose(
        &self,
        pack: &Pack,
        listener: &mut dyn UnpackListener,
        uninstall: &mut UninstallData,
        summary: &mut UnpackSummary,
    ) -> Result<()> {
        for file in &pack.files {
            let Some(target) = self.prepare(pack, file, listener, uninstall, summary)? else {
                continue;
            };
            let source = self.media_dir.join(&file.source);
            let mut reader = File::open(&source).map_err(|err| InstallerError::io(&source, err))?;
            self.write_file(pack, file, &target, &mut reader, uninstall, summary)?;
        }
        Ok(())
    }

    /// Resolves the target of `file`, or `None` when it is not to be written.
    fn prepare(
        &self,
        pack: &Pack,
        file: &PackFile,
        listener: &mut dyn UnpackListener,
        uninstall: &mut UninstallData,
        summary: &mut UnpackSummary,
    ) -> Result<Option<Utf8PathBuf>> {
        if !self.data.is_active(file.condition.as_deref(), &file.os) {
            debug!("skipping inactive {}", file.target);
            summary.skipped += 1;
            return Ok(None);
        }
        let target = self.resolve(&file.target)?;
        if target.exists() && !self.should_overwrite(file, &target, listener)? {
            debug!("keeping existing {target}");
            summary.skipped += 1;
            return Ok(None);
        }
        self.create_parents(&target, pack.uninstall, uninstall)?;
        Ok(Some(target))
    }

    fn resolve(&self, target: &str) -> Result<Utf8PathBuf> {
        resolve_target(
            Utf8Path::new(self.data.install_path()),
            &self.data.substitute(target),
        )
    }

    fn should_overwrite(
        &self,
        file: &PackFile,
        target: &Utf8Path,
        listener: &mut dyn UnpackListener,
    ) -> Result<bool> {
        Ok(match file.override_policy {
            OverridePolicy::True => true,
            OverridePolicy::False => false,
            OverridePolicy::Update => file.sha256.is_empty() || digest_of(target)? != file.sha256,
            OverridePolicy::AskTrue => listener.ask_overwrite(target, true),
            OverridePolicy::AskFalse => listener.ask_overwrite(target, false),
        })
    }

    fn create_parents(
        &self,
        target: &Utf8Path,
        record: bool,
        uninstall: &mut UninstallData,
    ) -> Result<()> {
        let Some(parent) = target.parent() else {
            return Ok(());
        };
        let missing: Vec<&Utf8Path> = parent.ancestors().take_while(|dir| !dir.exists()).collect();
        fs::create_dir_all(parent).map_err(|err| InstallerError::io(parent, err))?;
        if record {
            for dir in missing {
                uninstall.add_file(dir.as_str());
            }
        }
        Ok(())
    }

    fn write_file(
        &self,
        pack: &Pack,
        file: &PackFile,
        target: &Utf8Path,
        source: &mut dyn Read,
        uninstall: &mut UninstallData,
        summary: &mut UnpackSummary,
    ) -> Result<()> {
        let parent = target.parent().unwrap_or(target);
        let mut temp =
            tempfile::NamedTempFile::new_in(parent).map_err(|err| InstallerError::io(parent, err))?;
        let (actual, digest) = copy_hashed(&mut source.take(file.size), temp.as_file_mut())
            .map_err(|err| InstallerError::io(target, err))?;
        if actual != file.size {
            return Err(InstallerError::SizeMismatch {
                path: target.to_owned(),
                expected: file.size,
                actual,
            });
        }
        if !file.sha256.is_empty() && digest != file.sha256 {
            return Err(InstallerError::DigestMismatch {
                path: target.to_owned(),
            });
        }
        let executable = file.executable || self.is_executable_target(pack, target)?;
        if executable {
            mark_executable(temp.path()).map_err(|err| InstallerError::io(target, err))?;
        }
        temp.persist(target)
            .map_err(|err| InstallerError::io(target, err.error))?;
        debug!("installed {target} ({actual} bytes)");
        if pack.uninstall {
            uninstall.add_file(target.as_str());
        }
        summary.files += 1;
        summary.bytes += actual;
        Ok(())
    }

    fn is_executable_target(&self, pack: &Pack, target: &Utf8Path) -> Result<bool> {
        for executable in &pack.executables {
            if self.resolve(&executable.target)? == target {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn apply_parsables(&self, pack: &Pack) -> Result<()> {
        let substitutor = VariableSubstitutor::new(&self.data.variables);
        for parsable in &pack.parsables {
            if !self.data.is_active(parsable.condition.as_deref(), &parsable.os) {
                continue;
            }
            let path = self.resolve(&parsable.target)?;
            let text = match fs::read_to_string(&path) {
                Ok(text) => text,
                Err(err) => {
                    warn!("cannot parse {path}: {err}");
                    continue;
                }
            };
            let parsed = substitutor.substitute(&text, parsable.kind);
            fs::write(&path, parsed).map_err(|err| InstallerError::io(&path, err))?;
            debug!("substituted {} references in {path}", parsable.kind);
        }
        Ok(())
    }

    fn register_executables(&self, pack: &Pack, uninstall: &mut UninstallData) -> Result<()> {
        for executable in &pack.executables {
            if executable.stage != ExecutionStage::Uninstall
                || !self
                    .data
                    .is_active(executable.condition.as_deref(), &executable.os)
            {
                continue;
            }
            let path = self.resolve(&executable.target)?;
            uninstall.add_executable(UninstallExecutable {
                path: path.into_string(),
                arguments: self.arguments(&executable.arguments),
                failure: executable.failure,
            });
        }
        Ok(())
    }

    fn arguments(&self, arguments: &[String]) -> Vec<String> {
        arguments.iter().map(|arg| self.data.substitute(arg)).collect()
    }

    fn run_post_install(&self, pack: &Pack) -> Result<()> {
        for executable in &pack.executables {
            if executable.stage != ExecutionStage::PostInstall
                || !self
                    .data
                    .is_active(executable.condition.as_deref(), &executable.os)
            {
                continue;
            }
            let path = self.resolve(&executable.target)?;
            let arguments = self.arguments(&executable.arguments);
            let args: Vec<&str> = arguments.iter().map(String::as_str).collect();
            info!("running {path}");
            let failure = match self.executor.run(path.as_str(), &args) {
                Ok(output) if output.status.success() => None,
                Ok(output) => Some(describe_failure(&output)),
                Err(err) => Some(err.to_string()),
            };
            if let Some(status) = failure {
                match executable.failure {
                    FailurePolicy::Abort => {
                        return Err(InstallerError::ExecutableFailed { path, status });
                    }
                    FailurePolicy::Warn => warn!("{path} failed: {status}"),
                    FailurePolicy::Ignore => debug!("{path} failed: {status}"),
                }
            }
            if !executable.keep {
                if let Err(err) = fs::remove_file(&path) {
                    debug!("could not remove {path}: {err}");
                }
            }
        }
        Ok(())
    }
}

/// SHA-256 hex digest of the file at `path`.
fn digest_of(path: &Utf8Path) -> Result<String> {
    let mut file = File::open(path).map_err(|err| InstallerError::io(path, err))?;
    copy_hashed(&mut file, &mut io::sink())
        .map(|(_, digest)| digest)
        .map_err(|err| InstallerError::io(path, err))
}

/// Copies `source` into `sink`, returning its length and SHA-256 hex digest.
fn copy_hashed(source: &mut dyn Read, sink: &mut dyn Write) -> io::Result<(u64, String)> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    let mut total = 0_u64;
    loop {
        let bytes_read = source.read(&mut buffer)?;
        let Some(chunk) = buffer.get(..bytes_read).filter(|chunk| !chunk.is_empty()) else {
            break;
        };
        hasher.update(chunk);
        sink.write_all(chunk)?;
        total += chunk.len() as u64;
    }
    sink.flush()?;
    Ok((total, format!("{:x}", hasher.finalize())))
}

#[cfg(unix)]
fn mark_executable(path: &std::path::Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn mark_executable(_path: &std::path::Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
#[path = "unpacker_tests.rs"]
mod tests;
