//! CLI argument definitions for `instill-compile`.

use crate::config::{CompilerConfig, PackagingConfig};
use crate::pipeline::{CompileRequest, DEFAULT_ARTIFACT_NAME, default_base_dir};
use camino::Utf8PathBuf;
use clap::{Parser, ValueEnum};
use instill_common::model::Compression;

/// Compile an installation description into an installer artifact.
#[derive(Parser, Debug, Default)]
#[command(name = "instill-compile")]
#[command(version, about)]
#[command(long_about = concat!(
    "Compile an installation description into an installer artifact.\n\n",
    "The description (usually install.xml) names the packs, panels, conditions ",
    "and resources of the installer. Source paths are resolved against the base ",
    "directory, which defaults to the directory containing the description.\n\n",
    "Settings are read from instill.toml in the base directory when present; ",
    "command-line flags take precedence over the file.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  Compile with defaults, writing install.zip beside the description:\n",
    "    $ instill-compile install.xml\n\n",
    "  Choose the output and base directory:\n",
    "    $ instill-compile install.xml -b staging -o dist/app-installer.zip\n\n",
    "  Split pack data over 4.7 GB volumes, leaving room on the first disc:\n",
    "    $ instill-compile install.xml --multi-volume --volume-size 4700000000 \\\n",
    "        --first-volume-free 100000000\n",
))]
pub struct Cli {
    /// Installation description to compile.
    #[arg(value_name = "INSTALL_XML")]
    pub descriptor: Utf8PathBuf,

    /// Directory that source paths are resolved against.
    #[arg(short, long, value_name = "DIR")]
    pub base_dir: Option<Utf8PathBuf>,

    /// Installer artifact to write [default: <base dir>/install.zip].
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<Utf8PathBuf>,

    /// Configuration file [default: <base dir>/instill.toml when present].
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<Utf8PathBuf>,

    /// Stream pack data into volumes next to the artifact.
    #[arg(long)]
    pub multi_volume: bool,

    /// Largest volume size in bytes.
    #[arg(long, value_name = "BYTES", requires = "multi_volume")]
    pub volume_size: Option<u64>,

    /// Bytes to leave free on the first volume.
    #[arg(long, value_name = "BYTES", requires = "multi_volume")]
    pub first_volume_free: Option<u64>,

    /// Compression of pack entries in single-file mode.
    #[arg(long, value_enum, value_name = "METHOD", conflicts_with = "multi_volume")]
    pub compression: Option<CompressionArg>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(short, long = "verbose", action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbosity: u8,

    /// Suppress progress output (errors still shown).
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

/// Command-line spelling of [`Compression`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CompressionArg {
    /// Store pack data uncompressed.
    None,
    /// Deflate inside the zip entry.
    Deflate,
    /// Gzip stream.
    Gzip,
    /// Zstandard stream.
    Zstd,
}

impl From<CompressionArg> for Compression {
    fn from(value: CompressionArg) -> Self {
        match value {
            CompressionArg::None => Self::None,
            CompressionArg::Deflate => Self::Deflate,
            CompressionArg::Gzip => Self::Gzip,
            CompressionArg::Zstd => Self::Zstd,
        }
    }
}

impl Cli {
    /// Directory that source paths are resolved against.
    #[must_use]
    pub fn effective_base_dir(&self) -> Utf8PathBuf {
        self.base_dir
            .clone()
            .unwrap_or_else(|| default_base_dir(&self.descriptor))
    }

    /// Applies command-line overrides to `packaging`.
    #[must_use]
    pub fn apply_overrides(&self, mut packaging: PackagingConfig) -> PackagingConfig {
        if self.multi_volume {
            packaging.multi_volume = true;
        }
        if let Some(size) = self.volume_size {
            packaging.volume_size = size;
        }
        if let Some(free) = self.first_volume_free {
            packaging.first_volume_free = free;
        }
        if let Some(compression) = self.compression {
            packaging.compression = compression.into();
        }
        packaging
    }

    /// Builds the compile request from these arguments and the loaded `config`.
    #[must_use]
    pub fn request(&self, mut config: CompilerConfig) -> CompileRequest {
        let base_dir = self.effective_base_dir();
        config.packaging = self.apply_overrides(config.packaging);
        CompileRequest {
            descriptor: self.descriptor.clone(),
            output: self
                .output
                .clone()
                .unwrap_or_else(|| base_dir.join(DEFAULT_ARTIFACT_NAME)),
            base_dir,
            config,
            quiet: self.quiet,
        }
    }
}
