//! Splitting one logical stream across size-limited volumes.

use super::error::{Result, SpanningError};
use super::{MAGIC_LENGTH, MIN_VOLUME_SIZE, VolumeOptions, volume_path};
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use rand::RngCore;
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// Summary of a finished volume set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeSet {
    /// Path of the first volume.
    pub base: Utf8PathBuf,
    /// Number of volumes written.
    pub volume_count: usize,
    /// Payload bytes written across all volumes.
    pub payload_len: u64,
}

/// Writes a byte stream across size-limited volume files.
///
/// Volumes are named `base`, `base.1`, `base.2`, ... and each starts with
/// the same random magic number.
///
/// # Examples
///
/// ```no_run
/// use instill_common::spanning::{SpanningWriter, VolumeOptions};
/// use std::io::Write;
///
/// let mut writer = SpanningWriter::create("dist/app.pak", VolumeOptions::new(1_000_000))?;
/// writer.write_all(b"payload")?;
/// let set = writer.finish()?;
/// assert_eq!(set.volume_count, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct SpanningWriter {
    base: Utf8PathBuf,
    options: VolumeOptions,
    magic: [u8; MAGIC_LENGTH],
    current: BufWriter<File>,
    current_path: Utf8PathBuf,
    current_len: u64,
    volume_count: usize,
    file_pointer: u64,
}

impl SpanningWriter {
    /// Creates the first volume at `base`.
    ///
    /// # Errors
    ///
    /// Fails when either volume limit is below [`MIN_VOLUME_SIZE`] or the
    /// first volume cannot be created.
    pub fn create(base: impl Into<Utf8PathBuf>, options: VolumeOptions) -> Result<Self> {
        for size in [options.max_volume_size, options.first_volume_max()] {
            if size < MIN_VOLUME_SIZE {
                return Err(SpanningError::VolumeTooSmall {
                    size,
                    minimum: MIN_VOLUME_SIZE,
                });
            }
        }
        let base = base.into();
        let mut magic = [0_u8; MAGIC_LENGTH];
        rand::rng().fill_bytes(&mut magic);
        let (current, current_len) = open_volume(&base, &magic)?;
        debug!("opened volume {base}");
        Ok(Self {
            current_path: base.clone(),
            base,
            options,
            magic,
            current,
            current_len,
            volume_count: 1,
            file_pointer: 0,
        })
    }

    /// Payload bytes written so far.
    #[must_use]
    pub const fn file_pointer(&self) -> u64 {
        self.file_pointer
    }

    /// Volumes opened so far.
    #[must_use]
    pub const fn volume_count(&self) -> usize {
        self.volume_count
    }

    /// Magic number shared by this set.
    #[must_use]
    pub const fn magic(&self) -> &[u8; MAGIC_LENGTH] {
        &self.magic
    }

    /// Flushes the last volume and reports the set.
    ///
    /// # Errors
    ///
    /// Fails when the final flush fails.
    pub fn finish(mut self) -> Result<VolumeSet> {
        self.flush_current()?;
        Ok(VolumeSet {
            base: self.base,
            volume_count: self.volume_count,
            payload_len: self.file_pointer,
        })
    }

    fn capacity(&self) -> u64 {
        if self.volume_count == 1 {
            self.options.first_volume_max()
        } else {
            self.options.max_volume_size
        }
    }

    fn flush_current(&mut self) -> Result<()> {
        self.current.flush().map_err(|source| SpanningError::Io {
            path: self.current_path.clone(),
            source,
        })
    }

    fn next_volume(&mut self) -> Result<()> {
        self.flush_current()?;
        let path = volume_path(&self.base, self.volume_count);
        let (current, current_len) = open_volume(&path, &self.magic)?;
        debug!("opened volume {path}");
        self.current = current;
        self.current_len = current_len;
        self.current_path = path;
        self.volume_count += 1;
        Ok(())
    }
}

fn open_volume(path: &Utf8Path, magic: &[u8; MAGIC_LENGTH]) -> Result<(BufWriter<File>, u64)> {
    let io_error = |source| SpanningError::Io {
        path: path.to_owned(),
        source,
    };
    let mut writer = BufWriter::new(File::create(path).map_err(io_error)?);
    writer.write_all(magic).map_err(io_error)?;
    Ok((writer, MAGIC_LENGTH as u64))
}

impl Write for SpanningWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.current_len >= self.capacity() {
            self.next_volume()?;
        }
        let room = self.capacity() - self.current_len;
        let take = usize::try_from(room).map_or(buf.len(), |room| room.min(buf.len()));
        let written = self.current.write(&buf[..take])?;
        self.current_len += written as u64;
        self.file_pointer += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_current().map_err(io::Error::from)
    }
}
