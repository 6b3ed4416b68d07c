use std::sync::Mutex;

/// Read-length histogram bucket count. Matches the original engine's fixed
/// `MAX_READLENGTH` buffer size; reads longer than this saturate into the
/// last bucket rather than growing the histogram unboundedly.
pub(crate) const MAX_READLENGTH: usize = 1024;

/// Number of `a_min` offsets probed below (and, symmetrically, above) the
/// configured threshold when `track_amin_sweep` is enabled.
pub(crate) const AMIN_STEPS: usize = 5;

/// A point-in-time snapshot of scan progress and aggregate results,
/// returned by [`crate::ScanCoordinator::stats`] and bundled into the
/// [`crate::FindSequencesResult`] once a scan completes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stats {
    /// Read-length histogram; `read_lengths[n]` is the number of records
    /// whose trimmed read length was exactly `n` (saturating at the last
    /// index for reads at or beyond [`MAX_READLENGTH`]).
    pub read_lengths: Vec<u64>,
    /// Total number of syntactically valid records observed.
    pub records_parsed: u64,
    /// Decompressed bytes consumed so far.
    pub parsed: u64,
    /// Best current estimate of total decompressed bytes across all
    /// inputs; only ever read, never assumed exact (see
    /// [`crate::stream::FastqStream`]).
    pub total: u64,
    /// Number of interrupts observed since the scan started.
    pub sigints: u64,
    /// Per-base nucleotide composition across every parsed record's
    /// untrimmed bases, present only when `track_composition` is enabled.
    pub composition: Option<NucleotideComposition>,
    /// Longest-run-length histograms at [`AMIN_STEPS`] quality thresholds
    /// below and [`AMIN_STEPS`] above the configured `a_min`, present only
    /// when `track_amin_sweep` is enabled. Index 0 is the lowest threshold
    /// probed (`a_min - AMIN_STEPS`), index `2 * AMIN_STEPS - 1` the
    /// highest (`a_min + AMIN_STEPS - 1`).
    pub amin_sweep: Option<Vec<Vec<u64>>>,
}

/// Per-base nucleotide tallies over untrimmed bases, gated behind
/// `Config::track_composition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NucleotideComposition {
    pub a: u64,
    pub c: u64,
    pub g: u64,
    pub t: u64,
    pub n: u64,
    /// Any byte other than `A`/`C`/`G`/`T`/`N`.
    pub other: u64,
}

struct AggregatorInner {
    read_lengths: Vec<u64>,
    records_parsed: u64,
    composition: Option<NucleotideComposition>,
    amin_sweep: Option<Vec<Vec<u64>>>,
}

/// Thread-safe accumulator for the counters that do not already live in
/// [`crate::sink::HitSink`] or [`crate::stream::FastqStream`]: the
/// read-length histogram, the record count, and the two optional
/// diagnostics from §9 of the design.
pub(crate) struct StatsAggregator {
    inner: Mutex<AggregatorInner>,
}

impl StatsAggregator {
    pub(crate) fn new(track_composition: bool, track_amin_sweep: bool) -> Self {
        StatsAggregator {
            inner: Mutex::new(AggregatorInner {
                read_lengths: vec![0; MAX_READLENGTH],
                records_parsed: 0,
                composition: track_composition.then(NucleotideComposition::default),
                amin_sweep: track_amin_sweep.then(|| vec![vec![0u64; MAX_READLENGTH]; 2 * AMIN_STEPS]),
            }),
        }
    }

    pub(crate) fn add_records(&self, n: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.records_parsed += n;
    }

    pub(crate) fn add_readlength(&self, rl: usize) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let idx = rl.min(MAX_READLENGTH - 1);
        inner.read_lengths[idx] += 1;
    }

    /// Tallies `A`/`C`/`G`/`T`/`N`/other over `bases`, the record's
    /// untrimmed sequence. A no-op when composition tracking is disabled.
    pub(crate) fn add_composition(&self, bases: &[u8]) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(comp) = inner.composition.as_mut() else { return };
        for &b in bases {
            match b {
                b'A' => comp.a += 1,
                b'C' => comp.c += 1,
                b'G' => comp.g += 1,
                b'T' => comp.t += 1,
                b'N' => comp.n += 1,
                _ => comp.other += 1,
            }
        }
    }

    /// Recomputes the longest-kept-run length at each of `2 * AMIN_STEPS`
    /// thresholds around `a_min` and bumps the corresponding histogram
    /// bucket, following the original engine's `analyse_record` sweep: the
    /// first `AMIN_STEPS` thresholds step downward from `a_min - 1`, the
    /// remaining `AMIN_STEPS` step upward from `a_min`.
    pub(crate) fn add_amin_sweep(&self, quality: &[u8], a_min: u8) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let Some(sweep) = inner.amin_sweep.as_mut() else { return };
        for (i, bucket) in sweep.iter_mut().enumerate() {
            let threshold = amin_sweep_threshold(a_min, i);
            for_each_run_len(quality, threshold, |len| {
                bucket[len.min(MAX_READLENGTH - 1)] += 1;
            });
        }
    }

    pub(crate) fn snapshot(&self) -> (Vec<u64>, u64, Option<NucleotideComposition>, Option<Vec<Vec<u64>>>) {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        (inner.read_lengths.clone(), inner.records_parsed, inner.composition, inner.amin_sweep.clone())
    }
}

/// Calls `on_run` with the length of every maximal run of bytes `>=
/// threshold` in `quality`, in left-to-right order. Unlike
/// [`crate::record::longest_kept_run`], which keeps only the single
/// longest run for the main trimming pass, the `a_min` sweep tallies the
/// whole run-length distribution at each probed threshold.
fn for_each_run_len(quality: &[u8], threshold: u8, mut on_run: impl FnMut(usize)) {
    let mut run_len = 0usize;
    for &q in quality {
        if q >= threshold {
            run_len += 1;
        } else if run_len > 0 {
            on_run(run_len);
            run_len = 0;
        }
    }
    if run_len > 0 {
        on_run(run_len);
    }
}

/// The quality byte threshold probed at sweep index `i`, saturating at 0
/// rather than wrapping if `a_min` is near the bottom of the byte range.
fn amin_sweep_threshold(a_min: u8, i: usize) -> u8 {
    if i < AMIN_STEPS {
        let delta = (AMIN_STEPS - i) as u8;
        a_min.saturating_sub(delta)
    } else {
        let delta = (i - AMIN_STEPS) as u8;
        a_min.saturating_add(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readlength_histogram_saturates_at_cap() {
        let agg = StatsAggregator::new(false, false);
        agg.add_readlength(5);
        agg.add_readlength(5);
        agg.add_readlength(MAX_READLENGTH + 100);
        let (rls, records, comp, sweep) = agg.snapshot();
        assert_eq!(rls[5], 2);
        assert_eq!(rls[MAX_READLENGTH - 1], 1);
        assert_eq!(records, 0);
        assert!(comp.is_none());
        assert!(sweep.is_none());
    }

    #[test]
    fn records_parsed_accumulates() {
        let agg = StatsAggregator::new(false, false);
        agg.add_records(3);
        agg.add_records(4);
        let (_, records, ..) = agg.snapshot();
        assert_eq!(records, 7);
    }

    #[test]
    fn composition_tallies_bases_when_enabled() {
        let agg = StatsAggregator::new(true, false);
        agg.add_composition(b"AACGNN?");
        let (_, _, comp, _) = agg.snapshot();
        let comp = comp.unwrap();
        assert_eq!(comp.a, 2);
        assert_eq!(comp.c, 1);
        assert_eq!(comp.g, 1);
        assert_eq!(comp.n, 2);
        assert_eq!(comp.other, 1);
    }

    #[test]
    fn composition_disabled_by_default() {
        let agg = StatsAggregator::new(false, false);
        agg.add_composition(b"ACGT");
        let (_, _, comp, _) = agg.snapshot();
        assert!(comp.is_none());
    }

    #[test]
    fn amin_sweep_threshold_brackets_configured_minimum() {
        assert_eq!(amin_sweep_threshold(b'"', 0), b'"' - 5);
        assert_eq!(amin_sweep_threshold(b'"', AMIN_STEPS - 1), b'"' - 1);
        assert_eq!(amin_sweep_threshold(b'"', AMIN_STEPS), b'"');
        assert_eq!(amin_sweep_threshold(b'"', 2 * AMIN_STEPS - 1), b'"' + 4);
    }

    #[test]
    fn amin_sweep_records_every_maximal_run() {
        let agg = StatsAggregator::new(false, true);
        // At a_min itself (threshold index AMIN_STEPS), "II!!II" has two
        // runs of length 2.
        agg.add_amin_sweep(b"II!!II", b'"');
        let (.., sweep) = agg.snapshot();
        let sweep = sweep.unwrap();
        assert_eq!(sweep[AMIN_STEPS][2], 2);
    }
}
