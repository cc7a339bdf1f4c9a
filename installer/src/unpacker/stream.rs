//! Decoding pack data and moving through it by position.

use instill_common::model::Compression;
use std::io::{self, Read};

/// Pack data whose read position is tracked so files can be located by
/// their recorded offsets.
pub(crate) struct Positioned<R> {
    inner: R,
    position: u64,
}

impl<R: Read> Positioned<R> {
    pub(crate) const fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }

    /// Discards data up to `target`.
    pub(crate) fn seek_to(&mut self, target: u64) -> io::Result<()> {
        let Some(gap) = target.checked_sub(self.position) else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("pack data at {target} precedes the read position {}", self.position),
            ));
        };
        let skipped = io::copy(&mut self.by_ref().take(gap), &mut io::sink())?;
        if skipped < gap {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }
        Ok(())
    }
}

impl<R: Read> Read for Positioned<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.position += read as u64;
        Ok(read)
    }
}

/// Wraps a pack entry in the decoder for `compression`. Deflate is handled
/// by the zip entry itself.
pub(crate) fn decode<'r>(
    entry: impl Read + 'r,
    compression: Compression,
) -> io::Result<Box<dyn Read + 'r>> {
    Ok(match compression {
        Compression::None | Compression::Deflate => Box::new(entry),
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(entry)),
        Compression::Zstd => Box::new(zstd::Decoder::new(entry)?),
    })
}
