//! Compiler configuration loaded from `instill.toml`.
//!
//! The file is optional. Values absent from it fall back to defaults, and
//! command-line flags override whatever the file says.

use crate::error::{CompilerError, Result};
use camino::Utf8Path;
use instill_common::i18n::normalise_locale;
use instill_common::model::Compression;
use instill_common::spanning::{DEFAULT_VOLUME_SIZE, VolumeOptions};
use serde::Deserialize;

/// File name looked up in the base directory when `-c` is not given.
pub const CONFIG_FILE_NAME: &str = "instill.toml";

/// Settings for one compiler run.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Language assumed when the description declares no `<locale>`.
    ///
    /// Blank values are treated as absent.
    pub locale: Option<String>,
    /// How pack data is stored.
    pub packaging: PackagingConfig,
}

impl CompilerConfig {
    /// Loads the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`CompilerError::Io`] when the file cannot be read and
    /// [`CompilerError::Config`] when it is not valid TOML for this schema.
    pub fn from_file(path: &Utf8Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|err| CompilerError::io(path, err))?;
        toml::from_str(&source).map_err(|err| CompilerError::Config {
            path: path.to_owned(),
            reason: err.to_string(),
        })
    }

    /// Loads configuration through `loader`, which receives the path to read.
    ///
    /// # Examples
    ///
    /// ```
    /// use instill_compiler::config::CompilerConfig;
    ///
    /// let config = CompilerConfig::load_with("instill.toml", |_| CompilerConfig::default());
    /// assert!(!config.packaging.multi_volume);
    /// ```
    #[must_use]
    pub fn load_with<F>(path: &str, loader: F) -> Self
    where
        F: FnOnce(&str) -> Self,
    {
        loader(path)
    }

    /// Reads `explicit` when given, else `instill.toml` in `base_dir` when it
    /// exists, else the defaults.
    ///
    /// # Errors
    ///
    /// See [`Self::from_file`].
    pub fn discover(explicit: Option<&Utf8Path>, base_dir: &Utf8Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate = base_dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            log::debug!("using configuration {candidate}");
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the configured locale, if present.
    #[must_use]
    pub fn locale(&self) -> Option<&str> {
        normalise_locale(self.locale.as_deref())
    }
}

/// The `[packaging]` table.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PackagingConfig {
    /// Compression of pack entries in single-file mode.
    pub compression: Compression,
    /// Stream pack data into external volumes instead of the artifact.
    pub multi_volume: bool,
    /// Largest volume size in bytes.
    #[serde(default = "PackagingConfig::default_volume_size")]
    pub volume_size: u64,
    /// Bytes kept free on the first volume.
    pub first_volume_free: u64,
}

impl PackagingConfig {
    const fn default_volume_size() -> u64 {
        DEFAULT_VOLUME_SIZE
    }

    /// Volume limits described by this table.
    #[must_use]
    pub const fn volume_options(&self) -> VolumeOptions {
        VolumeOptions::new(self.volume_size).with_first_volume_free(self.first_volume_free)
    }
}

impl Default for PackagingConfig {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            multi_volume: false,
            volume_size: Self::default_volume_size(),
            first_volume_free: 0,
        }
    }
}
