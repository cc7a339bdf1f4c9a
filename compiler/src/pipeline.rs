//! Compile pipeline orchestration.
//!
//! Reads the description, validates it and packages the result, reporting
//! progress to a caller-supplied stream.

use crate::config::CompilerConfig;
use crate::descriptor::read_descriptor;
use crate::error::Result;
use crate::packager::{PackageOutput, package};
use crate::validate::validate;
use camino::{Utf8Path, Utf8PathBuf};
use log::info;
use std::io::Write;

/// Inputs for one compiler run.
#[derive(Clone, Debug)]
pub struct CompileRequest {
    /// The `install.xml` description.
    pub descriptor: Utf8PathBuf,
    /// Directory that `src` attributes are resolved against.
    pub base_dir: Utf8PathBuf,
    /// Artifact to write.
    pub output: Utf8PathBuf,
    /// Effective configuration.
    pub config: CompilerConfig,
    /// Suppress progress output.
    pub quiet: bool,
}

impl CompileRequest {
    /// Builds a request with defaults derived from `descriptor`: the base
    /// directory is the description's directory and the artifact is
    /// `<base>/install.zip`.
    #[must_use]
    pub fn for_descriptor(descriptor: impl Into<Utf8PathBuf>) -> Self {
        let descriptor = descriptor.into();
        let base_dir = default_base_dir(&descriptor);
        Self {
            output: base_dir.join(DEFAULT_ARTIFACT_NAME),
            base_dir,
            descriptor,
            config: CompilerConfig::default(),
            quiet: false,
        }
    }

    fn progress(&self, stderr: &mut dyn Write, message: impl std::fmt::Display) {
        if !self.quiet {
            write_stderr_line(stderr, message);
        }
    }
}

/// Artifact file name used when no output is given.
pub const DEFAULT_ARTIFACT_NAME: &str = "install.zip";

/// Directory containing `descriptor`, or `.` when it has none.
#[must_use]
pub fn default_base_dir(descriptor: &Utf8Path) -> Utf8PathBuf {
    descriptor
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .map_or_else(|| Utf8PathBuf::from("."), Utf8Path::to_owned)
}

/// Outcome of a successful compile.
#[derive(Clone, Debug)]
pub struct CompileReport {
    /// What the packager wrote.
    pub output: PackageOutput,
    /// Validation warnings.
    pub warnings: Vec<String>,
}

/// Compiles `request.descriptor` into `request.output`.
///
/// # Errors
///
/// Returns the first parse, validation or packaging error.
pub fn compile(request: &CompileRequest, stderr: &mut dyn Write) -> Result<CompileReport> {
    request.progress(stderr, format!("Reading {}...", request.descriptor));
    let mut descriptor = read_descriptor(
        &request.descriptor,
        &request.base_dir,
        request.config.locale(),
    )?;
    let validation = validate(&mut descriptor)?;
    for warning in &validation.warnings {
        request.progress(stderr, format!("warning: {warning}"));
    }

    request.progress(
        stderr,
        format!(
            "Packaging {} pack(s) into {}...",
            descriptor.model.packs.len(),
            request.output
        ),
    );
    let output = package(&mut descriptor, &request.output, &request.config.packaging)?;
    info!(
        "compiled {} ({} files, {} bytes)",
        output.artifact, output.files, output.payload_bytes
    );

    if let Some(volumes) = &output.volumes {
        request.progress(
            stderr,
            format!("Wrote {} volume(s) starting at {}", volumes.volume_count, volumes.base),
        );
    }
    request.progress(stderr, format!("Installer written to {}", output.artifact));

    Ok(CompileReport {
        output,
        warnings: validation.warnings,
    })
}

/// Writes `message` and a newline, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("install.xml", ".")]
    #[case("project/install.xml", "project")]
    #[case("/srv/app/install.xml", "/srv/app")]
    fn base_dir_defaults_to_the_description_directory(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(default_base_dir(Utf8Path::new(path)), Utf8PathBuf::from(expected));
    }

    #[rstest]
    fn request_defaults_place_the_artifact_beside_the_description() {
        let request = CompileRequest::for_descriptor("project/install.xml");
        assert_eq!(request.output, Utf8PathBuf::from("project/install.zip"));
        assert!(!request.quiet);
    }

    #[rstest]
    fn compiles_a_minimal_project() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8");
        std::fs::write(root.join("readme.txt"), "hello").expect("write");
        std::fs::write(
            root.join("install.xml"),
            r#"<installation>
                 <info><appname>Mini</appname><appversion>0.1</appversion></info>
                 <packs><pack name="Base" condition="ghost">
                   <file src="readme.txt" targetdir="$INSTALL_PATH"/>
                 </pack></packs>
               </installation>"#,
        )
        .expect("write");

        let request = CompileRequest::for_descriptor(root.join("install.xml"));
        let mut stderr = Vec::new();
        let report = compile(&request, &mut stderr).expect("compile");

        assert_eq!(report.output.files, 1);
        assert_eq!(report.output.payload_bytes, 5);
        assert_eq!(report.warnings, ["pack Base refers to undefined condition ghost"]);
        assert!(request.output.is_file());

        let text = String::from_utf8(stderr).expect("utf-8");
        assert!(text.contains("warning: pack Base refers to undefined condition ghost"));
        assert!(text.contains("Installer written to"));
    }

    #[rstest]
    fn quiet_runs_print_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8");
        let mut request = CompileRequest::for_descriptor(root.join("missing.xml"));
        request.quiet = true;

        let mut stderr = Vec::new();
        assert!(compile(&request, &mut stderr).is_err());
        assert!(stderr.is_empty());
    }
}
