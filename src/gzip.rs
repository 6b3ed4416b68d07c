use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::{Decompress, FlushDecompress, Status};

use crate::error::{ScanError, ScanResult, WithPathContext};

/// Bits forbidden in a gzip member's `FLG` byte, in the historic gzip
/// flag layout (continuation / encrypted / reserved), mirroring the
/// validation performed by the engine this crate's matching logic is
/// grounded on.
const FLG_FORBIDDEN: u8 = 0x02 | 0x20 | 0xC0;
const FLG_EXTRA: u8 = 0x04;
const FLG_NAME: u8 = 0x08;
const FLG_COMMENT: u8 = 0x10;

const IN_BUF_SIZE: usize = 64 * 1024;

/// Member-continuation threshold: a gzip trailer is 8 bytes (CRC32 +
/// ISIZE); anything at or below 10 leftover bytes after a stream ends is
/// assumed to be trailer padding rather than the start of another
/// member.
const MIN_NEXT_HEADER: usize = 10;

/// Inflates a gzip byte stream, transparently resuming across
/// concatenated ("multi-member") deflate streams.
///
/// Header framing and multi-member continuation are implemented here;
/// the DEFLATE math itself is delegated to [`flate2::Decompress`], used
/// in its raw (no zlib wrapper) mode.
pub(crate) struct GzipDecoder<R> {
    inner: R,
    path: PathBuf,
    decompress: Decompress,
    in_buf: Box<[u8]>,
    in_pos: usize,
    in_len: usize,
    finished: bool,
    /// Raw compressed bytes pulled from `inner` so far, independent of
    /// `decompress`'s own per-member counters (which reset across
    /// multi-member boundaries). Used by [`crate::stream::FastqStream`] to
    /// refine its size estimate as the scan progresses.
    compressed_in: u64,
    decompressed_out: u64,
}

impl<R: Read> GzipDecoder<R> {
    pub(crate) fn new(inner: R, path: impl Into<PathBuf>) -> ScanResult<Self> {
        let mut decoder = GzipDecoder {
            inner,
            path: path.into(),
            decompress: Decompress::new(false),
            in_buf: vec![0u8; IN_BUF_SIZE].into_boxed_slice(),
            in_pos: 0,
            in_len: 0,
            compressed_in: 0,
            decompressed_out: 0,
            finished: false,
        };
        if !decoder.read_gzip_header(0)? {
            return Err(ScanError::BadGzip { path: decoder.path, reason: "empty file" });
        }
        Ok(decoder)
    }

    fn fill(&mut self) -> io::Result<bool> {
        if self.in_pos < self.in_len {
            return Ok(true);
        }
        self.in_pos = 0;
        self.in_len = self.inner.read(&mut self.in_buf)?;
        self.compressed_in += self.in_len as u64;
        Ok(self.in_len > 0)
    }

    fn next_byte(&mut self) -> ScanResult<Option<u8>> {
        if !self.fill().with_path_context(&self.path)? {
            return Ok(None);
        }
        let b = self.in_buf[self.in_pos];
        self.in_pos += 1;
        Ok(Some(b))
    }

    fn require_byte(&mut self) -> ScanResult<u8> {
        self.next_byte()?.ok_or(ScanError::BadGzip { path: self.path.clone(), reason: "truncated gzip header" })
    }

    /// Shifts unconsumed bytes to the front of the buffer and reads as
    /// much more as fits, so the caller can learn exactly how many
    /// compressed bytes remain without guessing.
    fn compact_and_topoff(&mut self) -> io::Result<()> {
        if self.in_pos > 0 {
            self.in_buf.copy_within(self.in_pos..self.in_len, 0);
            self.in_len -= self.in_pos;
            self.in_pos = 0;
        }
        while self.in_len < self.in_buf.len() {
            let n = self.inner.read(&mut self.in_buf[self.in_len..])?;
            if n == 0 {
                break;
            }
            self.in_len += n;
            self.compressed_in += n as u64;
        }
        Ok(())
    }

    /// Looks for a gzip member header, tolerating up to `max_skip` junk
    /// bytes before the magic. Returns `Ok(false)` if the input ran out
    /// before a header could be found (clean end of stream); `Err` if a
    /// header's magic was found but its fields are invalid.
    fn read_gzip_header(&mut self, max_skip: usize) -> ScanResult<bool> {
        let mut skipped = 0usize;
        loop {
            let Some(b0) = self.next_byte()? else { return Ok(false) };
            if b0 != 0x1f {
                skipped += 1;
                if skipped > max_skip {
                    return Err(ScanError::BadGzip { path: self.path.clone(), reason: "bad magic byte" });
                }
                continue;
            }
            let Some(b1) = self.next_byte()? else { return Ok(false) };
            if b1 != 0x8b {
                skipped += 1;
                if skipped > max_skip {
                    return Err(ScanError::BadGzip { path: self.path.clone(), reason: "bad magic byte" });
                }
                continue;
            }
            break;
        }

        let method = self.require_byte()?;
        if method != 8 {
            return Err(ScanError::BadGzip { path: self.path.clone(), reason: "unsupported compression method" });
        }
        let flags = self.require_byte()?;
        if flags & FLG_FORBIDDEN != 0 {
            return Err(ScanError::BadGzip { path: self.path.clone(), reason: "unsupported gzip flags" });
        }
        for _ in 0..6 {
            // MTIME (4 bytes) + XFL + OS
            self.require_byte()?;
        }
        if flags & FLG_EXTRA != 0 {
            let lo = self.require_byte()? as u16;
            let hi = self.require_byte()? as u16;
            let xlen = lo | (hi << 8);
            for _ in 0..xlen {
                self.require_byte()?;
            }
        }
        if flags & FLG_NAME != 0 {
            while self.require_byte()? != 0 {}
        }
        if flags & FLG_COMMENT != 0 {
            while self.require_byte()? != 0 {}
        }

        self.decompress.reset(false);
        Ok(true)
    }

    /// Compressed bytes consumed from the underlying reader so far.
    pub(crate) fn compressed_consumed(&self) -> u64 {
        self.compressed_in
    }

    /// Decompressed bytes produced so far.
    pub(crate) fn decompressed_produced(&self) -> u64 {
        self.decompressed_out
    }
}

impl<R: Read> Read for GzipDecoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.finished {
            return Ok(0);
        }
        loop {
            if !self.fill()? {
                self.finished = true;
                return Ok(0);
            }

            let before_in = self.decompress.total_in();
            let before_out = self.decompress.total_out();
            let status = self
                .decompress
                .decompress(&self.in_buf[self.in_pos..self.in_len], buf, FlushDecompress::None)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("inflate error in {}: {e}", self.path.display())))?;
            let consumed = (self.decompress.total_in() - before_in) as usize;
            let produced = (self.decompress.total_out() - before_out) as usize;
            self.in_pos += consumed;

            if produced > 0 {
                self.decompressed_out += produced as u64;
                return Ok(produced);
            }

            if status == Status::StreamEnd {
                self.compact_and_topoff()?;
                if self.in_len > MIN_NEXT_HEADER {
                    let found = self.read_gzip_header(MIN_NEXT_HEADER).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
                    if found {
                        continue;
                    }
                }
                self.finished = true;
                return Ok(0);
            }

            if consumed == 0 {
                // Decompressor made no progress on a non-empty input and
                // did not signal stream end: the output buffer is full
                // or the caller asked for zero bytes.
                return Ok(0);
            }
        }
    }
}
