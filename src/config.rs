/// Process-wide scan configuration.
///
/// A `Config` is mutated only through [`ScanCoordinator::configure`] and is
/// never touched while a scan is in progress; the coordinator refuses a
/// reconfiguration attempt made mid-scan the same way it refuses a second
/// concurrent `find_sequences` call.
///
/// [`ScanCoordinator::configure`]: crate::ScanCoordinator::configure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of mismatches tolerated in a single hit.
    pub max_errors: usize,
    /// Minimum number of overlapping bases required for a head/tail
    /// overlap hit (cases A and B in the matcher).
    pub min_overlap: usize,
    /// Reads trimmed shorter than this are skipped entirely.
    pub min_read_length: usize,
    /// Worker thread count. Defaults to the logical CPU count.
    pub n_threads: usize,
    /// Quality byte threshold: bases with `quality >= a_min` are kept by
    /// the trimmer. Typically `b'!'` (Phred+33, Q=0) or higher.
    pub a_min: u8,
    /// Quality byte representing Q=0, used only to interpret `a_min`
    /// offsets when reporting; carries no effect on trimming itself.
    pub a_zero: u8,
    /// Also tally per-base nucleotide composition while parsing records.
    pub track_composition: bool,
    /// Also recompute the trimmed-read length at a handful of `a_min`
    /// offsets around the configured threshold, for trimming-sensitivity
    /// analysis.
    pub track_amin_sweep: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_errors: 0,
            min_overlap: 20,
            min_read_length: 1,
            n_threads: num_cpus::get(),
            a_min: b'!',
            a_zero: b'!',
            track_composition: false,
            track_amin_sweep: false,
        }
    }
}

/// Partial update applied by [`ScanCoordinator::configure`].
///
/// Every field is optional so a caller may touch a single knob without
/// restating the rest of the configuration.
///
/// [`ScanCoordinator::configure`]: crate::ScanCoordinator::configure
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub max_errors: Option<usize>,
    pub min_overlap: Option<usize>,
    pub min_read_length: Option<usize>,
    pub n_threads: Option<usize>,
    pub a_min: Option<u8>,
    pub a_zero: Option<u8>,
    pub track_composition: Option<bool>,
    pub track_amin_sweep: Option<bool>,
}

impl Config {
    pub(crate) fn apply(&mut self, update: ConfigUpdate) {
        if let Some(v) = update.max_errors {
            self.max_errors = v;
        }
        if let Some(v) = update.min_overlap {
            self.min_overlap = v;
        }
        if let Some(v) = update.min_read_length {
            self.min_read_length = v;
        }
        if let Some(v) = update.n_threads {
            self.n_threads = v;
        }
        if let Some(v) = update.a_min {
            self.a_min = v;
        }
        if let Some(v) = update.a_zero {
            self.a_zero = v;
        }
        if let Some(v) = update.track_composition {
            self.track_composition = v;
        }
        if let Some(v) = update.track_amin_sweep {
            self.track_amin_sweep = v;
        }
    }
}
