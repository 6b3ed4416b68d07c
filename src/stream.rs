use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

use crate::error::{ScanError, ScanResult, WithPathContext};
use crate::gzip::GzipDecoder;

/// One-shot diagnostic, printed at most once per process the first time a
/// gzip file's actual compression ratio blows well past the initial 3x
/// guess, in the same fire-once style as the teacher's own
/// `GIVE_WARNING_FOR_LONG_FASTQ`.
static WARN_SIZE_ESTIMATE_REVISED: LazyLock<()> = LazyLock::new(|| {
    eprintln!("WARNING: gzip size estimate required a large upward revision; initial 3x guess underestimated actual compression ratio");
});

/// Default chunk size handed to each worker. Must be at least twice the
/// longest record the caller expects to see, per the tail-trim contract in
/// §4.2 of the design: a chunk this size that contains no record boundary
/// is reported as [`ScanError::ShortBuffer`] rather than silently merged
/// with the next read.
pub(crate) const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// A first-guess expansion factor applied to a gzip file's on-disk size
/// before any bytes have actually been inflated.
const GZIP_SIZE_GUESS_FACTOR: u64 = 3;

enum OpenFile {
    Plain(File),
    Gzip(Box<GzipDecoder<File>>),
}

impl Read for OpenFile {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            OpenFile::Plain(f) => f.read(buf),
            OpenFile::Gzip(g) => g.read(buf),
        }
    }
}

struct PendingFile {
    path: PathBuf,
    on_disk_size: u64,
    is_gz: bool,
    /// This file's current contribution to `size_estimate`: the initial
    /// 3x guess until the first refinement, then whatever the last
    /// refinement computed.
    current_estimate: u64,
}

struct StreamInner {
    pending: Vec<PendingFile>,
    next_pending: usize,
    current: Option<OpenFile>,
    current_path: Option<PathBuf>,
    /// Carry: the unfinished tail of the previous chunk, re-prepended to
    /// the start of the next one.
    carry: Vec<u8>,
    /// Cumulative decompressed bytes returned to callers so far, across
    /// every file. Used to compute each chunk's absolute `base_offset`.
    returned: u64,
    /// Cumulative decompressed bytes consumed from the *current* file
    /// before the carry, needed to keep the size estimate refinement
    /// anchored to one file's actual compression ratio at a time.
    size_estimate: u64,
}

/// A single shared byte source over a sequence of input files (each plain
/// or gzip), producing chunks whose last byte always lands on a complete
/// FASTQ record boundary.
///
/// All state lives behind one mutex; [`FastqStream::next_chunk`] holds it
/// only for the duration of one chunk's I/O and tail-trim, so workers
/// serialize on file access but do all CPU-bound parsing and matching
/// outside the lock.
pub(crate) struct FastqStream {
    inner: Mutex<StreamInner>,
}

impl FastqStream {
    pub(crate) fn new(paths: &[PathBuf]) -> ScanResult<Self> {
        let mut pending = Vec::with_capacity(paths.len());
        let mut size_estimate = 0u64;
        for path in paths {
            let meta = std::fs::metadata(path).with_path_context(path)?;
            let is_gz = path.extension().is_some_and(|ext| ext == "gz");
            let on_disk_size = meta.len();
            let current_estimate = if is_gz { on_disk_size * GZIP_SIZE_GUESS_FACTOR } else { on_disk_size };
            size_estimate += current_estimate;
            pending.push(PendingFile { path: path.to_path_buf(), on_disk_size, is_gz, current_estimate });
        }

        Ok(FastqStream {
            inner: Mutex::new(StreamInner {
                pending,
                next_pending: 0,
                current: None,
                current_path: None,
                carry: Vec::new(),
                returned: 0,
                size_estimate,
            }),
        })
    }

    /// Decompressed bytes returned to callers so far.
    pub(crate) fn parsed(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).returned
    }

    /// Best current estimate of total decompressed bytes across all
    /// inputs.
    pub(crate) fn total_estimate(&self) -> u64 {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).size_estimate
    }

    /// Pulls the next record-aligned chunk into `out_buf`, returning
    /// `Some((n, base_offset))` or `None` at end of all input. `out_buf`
    /// must be at least [`DEFAULT_CHUNK_SIZE`] long for the tail-trim
    /// contract to hold in practice, though any size large enough to hold
    /// one record is accepted.
    pub(crate) fn next_chunk(&self, out_buf: &mut [u8]) -> ScanResult<Option<(usize, u64)>> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let inner = &mut *inner;

        let carry_len = inner.carry.len();
        out_buf[..carry_len].copy_from_slice(&inner.carry);
        inner.carry.clear();

        let mut filled = carry_len;
        while filled < out_buf.len() {
            if inner.current.is_none() && !open_next(inner)? {
                break;
            }
            let n = {
                let file = inner.current.as_mut().unwrap();
                file.read(&mut out_buf[filled..]).with_path_context(inner.current_path.as_ref().unwrap())?
            };
            if n == 0 {
                refine_estimate(inner);
                inner.current = None;
                inner.current_path = None;
                continue;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        let exhausted = inner.current.is_none() && inner.next_pending >= inner.pending.len();

        // A well-formed input file holds only complete records, so once
        // every file has been read to true EOF there is nothing left to
        // defer: the whole filled region is returned as-is and the tail-
        // trim search (which otherwise always defers the buffer's final
        // record, since it can only confirm a record is complete by
        // finding the *next* one) is skipped.
        let boundary = if exhausted { filled } else { find_tail_boundary(&out_buf[..filled])? };
        inner.carry.extend_from_slice(&out_buf[boundary..filled]);

        let base_offset = inner.returned;
        inner.returned += boundary as u64;
        refine_estimate(inner);

        Ok(Some((boundary, base_offset)))
    }
}

/// Opens the next pending file, returning `false` if the list is
/// exhausted. May leave `current` as `None` on a clean exhaustion.
fn open_next(inner: &mut StreamInner) -> ScanResult<bool> {
    if inner.next_pending >= inner.pending.len() {
        return Ok(false);
    }
    let pending = &inner.pending[inner.next_pending];
    inner.next_pending += 1;

    let file = File::open(&pending.path).with_path_context(&pending.path)?;
    let opened = if pending.is_gz {
        OpenFile::Gzip(Box::new(GzipDecoder::new(file, pending.path.clone())?))
    } else {
        OpenFile::Plain(file)
    };
    inner.current = Some(opened);
    inner.current_path = Some(pending.path.clone());
    Ok(true)
}

/// Revises `size_estimate` using the actual compression ratio observed so
/// far on the currently (or just-finished) open gzip file, per §4.2: "For
/// gzip files, multiply estimate by 3 as a first guess; refine as a scan
/// progresses using the ratio of decompressed bytes produced to
/// compressed bytes consumed."
fn refine_estimate(inner: &mut StreamInner) {
    let Some(OpenFile::Gzip(g)) = inner.current.as_ref() else { return };
    let consumed = g.compressed_consumed();
    let produced = g.decompressed_produced();
    if consumed == 0 || produced == 0 {
        return;
    }
    let idx = inner.next_pending - 1;
    let pending = &mut inner.pending[idx];
    let ratio = produced as f64 / consumed as f64;
    let revised = (pending.on_disk_size as f64 * ratio).ceil() as u64;

    if revised > pending.current_estimate.saturating_mul(2) {
        *WARN_SIZE_ESTIMATE_REVISED;
    }

    // Swap this file's previously tracked contribution for the refined
    // figure, rather than assuming it still holds the original 3x guess.
    inner.size_estimate =
        inner.size_estimate.saturating_sub(pending.current_estimate).saturating_add(revised).max(inner.returned);
    pending.current_estimate = revised;
}

/// Tail-trim rule from §4.2: scan backward from the end of the filled
/// region for a line beginning with `+`, then accept the next `@`-led
/// line found *before* it (walking backward) as the record boundary. This
/// resolves the well-known FASTQ ambiguity where `@` is also a legal
/// quality byte, since line 3 is always `+...` and therefore unambiguous.
fn find_tail_boundary(buf: &[u8]) -> ScanResult<usize> {
    let n = buf.len();
    let mut seen_plus = false;
    let mut pos = n;

    // Walk backward one byte at a time; a line start is only trusted once
    // its preceding byte (a line terminator) is actually present, so the
    // very first byte of `buf` can never be accepted as a boundary unless
    // a terminator behind it is visible in this same buffer — matching
    // the original engine's `fastq_rewind`, which cannot look before
    // index 0 either.
    while pos > 1 {
        pos -= 1;
        let prev = buf[pos - 1];
        let at_line_start = prev == b'\n' || prev == b'\r';
        if !at_line_start {
            continue;
        }
        if buf[pos] == b'+' {
            seen_plus = true;
        } else if seen_plus && buf[pos] == b'@' {
            return Ok(pos);
        }
    }

    Err(ScanError::ShortBuffer)
}
