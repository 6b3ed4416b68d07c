use std::sync::Mutex;

use crate::error::{ScanError, ScanResult};
use crate::matcher::Hit;

/// Append-only, thread-safe collection of hits and their matching read
/// substrings, plus the per-reference counters derived from them.
///
/// All mutation happens through [`HitSink::append`], taken under a single
/// mutex; the lock is held only long enough to push onto the backing
/// vectors, mirroring the "growable array under a mutex" replacement this
/// crate uses in place of the original engine's linked-list accumulator.
pub(crate) struct HitSink {
    inner: Mutex<SinkInner>,
}

struct SinkInner {
    hits: Vec<Hit>,
    hitseqs: Vec<Vec<u8>>,
    seqhits: Vec<u64>,
    seqbasehits: Vec<u64>,
}

impl HitSink {
    pub(crate) fn new(n_references: usize) -> Self {
        HitSink {
            inner: Mutex::new(SinkInner {
                hits: Vec::new(),
                hitseqs: Vec::new(),
                seqhits: vec![0; n_references],
                seqbasehits: vec![0; n_references],
            }),
        }
    }

    /// Records one hit and its matching bases. `seq_nr` must be a valid
    /// index into the reference list the sink was sized for.
    ///
    /// Reserves space with `try_reserve` before touching any of the
    /// backing vectors, so a failed allocation surfaces as
    /// [`ScanError::OutOfMemory`] rather than aborting the process the way
    /// an infallible `push` would.
    pub(crate) fn append(&self, hit: Hit, hit_seq: &[u8]) -> ScanResult<()> {
        let mut owned_seq = Vec::new();
        owned_seq.try_reserve_exact(hit_seq.len()).map_err(|_| ScanError::OutOfMemory)?;
        owned_seq.extend_from_slice(hit_seq);

        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.hits.try_reserve(1).map_err(|_| ScanError::OutOfMemory)?;
        inner.hitseqs.try_reserve(1).map_err(|_| ScanError::OutOfMemory)?;

        inner.seqhits[hit.seq_nr] += 1;
        inner.seqbasehits[hit.seq_nr] += hit.length as u64;
        inner.hits.push(hit);
        inner.hitseqs.push(owned_seq);
        Ok(())
    }

    /// Consumes the sink, returning its contents. Called once, after all
    /// workers have joined.
    pub(crate) fn into_parts(self) -> (Vec<Hit>, Vec<Vec<u8>>, Vec<u64>, Vec<u64>) {
        let inner = self.inner.into_inner().unwrap_or_else(|e| e.into_inner());
        (inner.hits, inner.hitseqs, inner.seqhits, inner.seqbasehits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(seq_nr: usize, length: usize) -> Hit {
        Hit { seq_nr, file_pos: 0, seq_pos: 0, length, readlength: length }
    }

    #[test]
    fn append_updates_per_reference_counters() {
        let sink = HitSink::new(2);
        sink.append(hit(0, 4), b"ACGT").unwrap();
        sink.append(hit(0, 3), b"ACG").unwrap();
        sink.append(hit(1, 4), b"TTTT").unwrap();

        let (hits, hitseqs, seqhits, seqbasehits) = sink.into_parts();
        assert_eq!(hits.len(), 3);
        assert_eq!(hitseqs.len(), 3);
        assert_eq!(seqhits, vec![2, 1]);
        assert_eq!(seqbasehits, vec![7, 4]);
    }

    #[test]
    fn hitseqs_align_positionally_with_hits() {
        let sink = HitSink::new(1);
        sink.append(hit(0, 4), b"ACGT").unwrap();
        sink.append(hit(0, 2), b"AC").unwrap();
        let (hits, hitseqs, ..) = sink.into_parts();
        for (h, seq) in hits.iter().zip(hitseqs.iter()) {
            assert_eq!(h.length, seq.len());
        }
    }
}
