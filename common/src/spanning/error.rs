//! Errors raised while writing or reading volume sets.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors raised while writing or reading a multi-volume payload.
#[derive(Debug, Error)]
pub enum SpanningError {
    /// A volume limit leaves no room for payload after the magic number.
    #[error("volume size {size} is below the minimum of {minimum} bytes")]
    VolumeTooSmall {
        /// Usable size requested.
        size: u64,
        /// Smallest accepted size.
        minimum: u64,
    },

    /// A volume's magic number differs from the first volume's.
    #[error("volume {path} does not belong to this set")]
    CorruptVolume {
        /// Offending volume.
        path: Utf8PathBuf,
    },

    /// A volume could not be found and no locator supplied a replacement.
    #[error("volume {index} not found at {path}")]
    VolumeNotFound {
        /// Expected location.
        path: Utf8PathBuf,
        /// Zero-based volume number.
        index: usize,
    },

    /// Reading or writing a volume failed.
    #[error("I/O error on volume {path}: {source}")]
    Io {
        /// Volume being accessed.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias using [`SpanningError`].
pub type Result<T> = std::result::Result<T, SpanningError>;

impl From<SpanningError> for std::io::Error {
    fn from(error: SpanningError) -> Self {
        match error {
            SpanningError::Io { source, .. } => source,
            SpanningError::VolumeNotFound { .. } => {
                Self::new(std::io::ErrorKind::NotFound, error)
            }
            other => Self::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
