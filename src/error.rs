use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Everything that can go wrong while opening input or running a scan.
///
/// Modeled on the hand-rolled error enums used throughout this crate's
/// I/O layer: a plain enum with a manual `Display`, no derive macro, and
/// a `source()` that forwards to the wrapped [`io::Error`] where one
/// exists.
#[derive(Debug)]
#[non_exhaustive]
pub enum ScanError {
    /// Could not open or read an input file.
    Io { path: PathBuf, source: io::Error },
    /// Gzip header or inflate stream was malformed.
    BadGzip { path: PathBuf, reason: &'static str },
    /// A record did not start with `@` or its separator line did not
    /// start with `+`.
    MalformedRecord { file_pos: u64 },
    /// The chunk buffer was too small to contain one complete record.
    ShortBuffer,
    /// The hit sink could not grow to hold another hit.
    OutOfMemory,
    /// `find_sequences` was called while a scan was already running.
    Busy,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ScanError::BadGzip { path, reason } => {
                write!(f, "malformed gzip stream in {}: {reason}", path.display())
            }
            ScanError::MalformedRecord { file_pos } => {
                write!(f, "malformed FASTQ record at byte offset {file_pos}")
            }
            ScanError::ShortBuffer => {
                write!(f, "chunk buffer too small to contain a complete record")
            }
            ScanError::OutOfMemory => write!(f, "failed to allocate space for a hit"),
            ScanError::Busy => write!(f, "a scan is already running"),
        }
    }
}

impl std::error::Error for ScanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ScanError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Attaches a file path to an [`io::Error`] at the point the failing
/// operation is known to be file-scoped, the way `MapFailedOpenExt` does
/// for this crate's readers.
pub(crate) trait WithPathContext<T> {
    fn with_path_context(self, path: &Path) -> ScanResult<T>;
}

impl<T> WithPathContext<T> for io::Result<T> {
    fn with_path_context(self, path: &Path) -> ScanResult<T> {
        self.map_err(|source| ScanError::Io { path: path.to_path_buf(), source })
    }
}
