//! Multi-volume payload streams.
//!
//! A payload too large for one medium is written through
//! [`SpanningWriter`] into a set of volume files and read back with
//! [`SpanningReader`]. Every volume starts with a [`MAGIC_LENGTH`]-byte random
//! number shared by the set, which lets the reader reject volumes from
//! another build.

mod error;
mod locator;
mod reader;
mod writer;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

pub use error::{Result, SpanningError};
#[cfg(test)]
pub use locator::MockVolumeLocator;
pub use locator::{NoLocator, VolumeLocator};
pub use reader::SpanningReader;
pub use writer::{SpanningWriter, VolumeSet};

/// Bytes of magic number at the start of every volume.
pub const MAGIC_LENGTH: usize = 10;
/// Smallest usable volume: the magic number plus one payload byte.
pub const MIN_VOLUME_SIZE: u64 = MAGIC_LENGTH as u64 + 1;
/// Kilobyte used for volume sizes, as media vendors count it.
pub const KB: u64 = 1000;
/// Megabyte used for volume sizes.
pub const MB: u64 = 1000 * KB;
/// Default volume size, one CD.
pub const DEFAULT_VOLUME_SIZE: u64 = 650 * MB;

/// Size limits for a volume set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VolumeOptions {
    /// Largest size of any volume file, magic included.
    pub max_volume_size: u64,
    /// Space kept free on the first volume for the installer itself.
    pub first_volume_free: u64,
}

impl VolumeOptions {
    /// Options with `max_volume_size` and nothing reserved.
    #[must_use]
    pub const fn new(max_volume_size: u64) -> Self {
        Self {
            max_volume_size,
            first_volume_free: 0,
        }
    }

    /// Reserves `bytes` on the first volume.
    #[must_use]
    pub const fn with_first_volume_free(mut self, bytes: u64) -> Self {
        self.first_volume_free = bytes;
        self
    }

    /// Largest size of the first volume.
    #[must_use]
    pub const fn first_volume_max(&self) -> u64 {
        self.max_volume_size.saturating_sub(self.first_volume_free)
    }
}

impl Default for VolumeOptions {
    fn default() -> Self {
        Self::new(DEFAULT_VOLUME_SIZE)
    }
}

/// Index of a volume set stored in the installer as `resources/volumes.info`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumesInfo {
    /// File name of the first volume, relative to the media directory.
    pub first_volume: String,
    /// Number of volumes in the set.
    pub volume_count: usize,
    /// Total payload length.
    pub payload_len: u64,
}

/// Path of volume `index`: `base` itself for the first, then `base.<index>`.
#[must_use]
pub fn volume_path(base: &Utf8Path, index: usize) -> Utf8PathBuf {
    if index == 0 {
        base.to_owned()
    } else {
        Utf8PathBuf::from(format!("{base}.{index}"))
    }
}

#[cfg(test)]
mod tests;
