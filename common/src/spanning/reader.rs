//! Reading one logical stream back from a set of volumes.

use super::error::{Result, SpanningError};
use super::locator::{NoLocator, VolumeLocator};
use super::{MAGIC_LENGTH, volume_path};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufReader, Read};

/// Reads back a stream written by [`super::SpanningWriter`].
///
/// Volumes are opened on demand. A volume that is missing is looked up
/// through the [`VolumeLocator`]; one whose magic number differs from the
/// first volume's is rejected.
pub struct SpanningReader<L = NoLocator> {
    base: Utf8PathBuf,
    volume_count: usize,
    index: usize,
    magic: [u8; MAGIC_LENGTH],
    current: BufReader<File>,
    current_path: Utf8PathBuf,
    file_pointer: u64,
    locator: L,
}

impl SpanningReader<NoLocator> {
    /// Opens a set of `volume_count` volumes starting at `base`.
    ///
    /// # Errors
    ///
    /// Fails when the first volume is missing or shorter than its magic number.
    pub fn open(base: impl Into<Utf8PathBuf>, volume_count: usize) -> Result<Self> {
        Self::with_locator(base, volume_count, NoLocator)
    }
}

impl<L: VolumeLocator> SpanningReader<L> {
    /// Opens a set, consulting `locator` for volumes that cannot be found.
    ///
    /// # Errors
    ///
    /// See [`SpanningReader::open`].
    pub fn with_locator(
        base: impl Into<Utf8PathBuf>,
        volume_count: usize,
        mut locator: L,
    ) -> Result<Self> {
        let base = base.into();
        let (path, file) = locate(&base, 0, &mut locator)?;
        let mut current = BufReader::new(file);
        let mut magic = [0_u8; MAGIC_LENGTH];
        read_magic(&mut current, &path, &mut magic)?;
        Ok(Self {
            base,
            volume_count: volume_count.max(1),
            index: 0,
            magic,
            current,
            current_path: path,
            file_pointer: 0,
            locator,
        })
    }

    /// Payload bytes consumed so far.
    #[must_use]
    pub const fn file_pointer(&self) -> u64 {
        self.file_pointer
    }

    /// Zero-based number of the volume being read.
    #[must_use]
    pub const fn current_volume(&self) -> usize {
        self.index
    }

    /// Discards `count` payload bytes, returning how many were skipped.
    ///
    /// # Errors
    ///
    /// Propagates failures to open or read intervening volumes.
    pub fn skip(&mut self, count: u64) -> io::Result<u64> {
        io::copy(&mut self.by_ref().take(count), &mut io::sink())
    }

    fn next_volume(&mut self) -> Result<()> {
        let index = self.index + 1;
        let expected = volume_path(&self.base, index);
        let (path, file) = locate(&expected, index, &mut self.locator)?;
        let mut current = BufReader::new(file);
        let mut magic = [0_u8; MAGIC_LENGTH];
        read_magic(&mut current, &path, &mut magic)?;
        if magic != self.magic {
            return Err(SpanningError::CorruptVolume { path });
        }
        debug!("switched to volume {path}");
        self.current = current;
        self.current_path = path;
        self.index = index;
        Ok(())
    }
}

fn locate<L: VolumeLocator>(
    expected: &Utf8Path,
    index: usize,
    locator: &mut L,
) -> Result<(Utf8PathBuf, File)> {
    let mut candidate = expected.to_owned();
    loop {
        match File::open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                info!("volume {index} not found at {candidate}");
                match locator.locate(&candidate, index) {
                    Some(next) => candidate = next,
                    None => {
                        return Err(SpanningError::VolumeNotFound {
                            path: expected.to_owned(),
                            index,
                        });
                    }
                }
            }
            Err(source) => {
                return Err(SpanningError::Io {
                    path: candidate,
                    source,
                });
            }
        }
    }
}

fn read_magic(
    reader: &mut impl Read,
    path: &Utf8Path,
    magic: &mut [u8; MAGIC_LENGTH],
) -> Result<()> {
    reader.read_exact(magic).map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            SpanningError::CorruptVolume {
                path: path.to_owned(),
            }
        } else {
            SpanningError::Io {
                path: path.to_owned(),
                source,
            }
        }
    })
}

impl<L: VolumeLocator> Read for SpanningReader<L> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let read = self.current.read(buf).map_err(|source| SpanningError::Io {
                path: self.current_path.clone(),
                source,
            })?;
            if read > 0 {
                self.file_pointer += read as u64;
                return Ok(read);
            }
            if self.index + 1 >= self.volume_count {
                return Ok(0);
            }
            self.next_volume()?;
        }
    }
}
