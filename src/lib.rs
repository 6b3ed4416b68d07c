//! Parallel streaming scanner for approximate DNA sequence matches in
//! (optionally gzip-compressed) FASTQ files.
//!
//! The engine quality-trims every read to the longest contiguous run of
//! bases at or above a configurable PHRED threshold, then searches the
//! trimmed read against a set of reference sequences allowing a bounded
//! number of mismatches. Matching is distributed across worker threads
//! that pull record-aligned chunks from a single shared byte stream, so
//! the same code path handles plain and gzip input, single files and
//! file sequences, without ever needing to seek to a record boundary.

mod config;
mod error;
mod gzip;
mod matcher;
mod record;
mod sink;
mod stats;
mod stream;

mod engine;

pub use config::{Config, ConfigUpdate};
pub use engine::{FindSequencesResult, ScanCoordinator};
pub use error::{ScanError, ScanResult};
pub use matcher::Hit;
pub use stats::{NucleotideComposition, Stats};
