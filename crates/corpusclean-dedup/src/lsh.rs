//! LSH banding over MinHash signatures.
//!
//! A `k`-length signature is split into `b` bands of `r` rows; two documents
//! are candidates for comparison iff they share at least one band bucket.
//! This keeps comparison cost near-linear in corpus size: only bucket
//! collisions are ever verified, never all pairs. The `(b, r)` split sets the
//! S-curve of collision probability against true similarity — more bands
//! catch lower similarities, more rows sharpen the cutoff.

use crate::minhash::MinHashSignature;
use corpusclean_core::DocId;
use std::collections::HashMap;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Corpus-wide band-bucket index.
///
/// Grows monotonically within a run; only the pipeline's commit lane may call
/// [`BandedIndex::commit`]. Stores ids only, never text or signatures.
#[derive(Debug)]
pub struct BandedIndex {
    bands: usize,
    rows_per_band: usize,
    buckets: Vec<HashMap<u64, Vec<DocId>>>,
}

impl BandedIndex {
    /// `bands * rows_per_band` must equal the signature length; enforced by
    /// [`corpusclean_core::PipelineConfig::validate`] before construction.
    pub fn new(bands: usize, rows_per_band: usize) -> Self {
        Self {
            bands,
            rows_per_band,
            buckets: (0..bands).map(|_| HashMap::new()).collect(),
        }
    }

    /// Already-committed documents sharing at least one band bucket with
    /// `signature`. Read-only: calling this twice returns the same answer.
    pub fn candidates(&self, signature: &MinHashSignature) -> Vec<DocId> {
        let mut out: Vec<DocId> = Vec::new();
        for (band_idx, chunk) in signature.values.chunks(self.rows_per_band).enumerate() {
            if band_idx >= self.bands {
                break;
            }
            if let Some(ids) = self.buckets[band_idx].get(&band_key(band_idx, chunk)) {
                out.extend(ids.iter().copied());
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Register `doc_id` in each of its band buckets, making it visible to
    /// every later [`BandedIndex::candidates`] lookup.
    pub fn commit(&mut self, doc_id: DocId, signature: &MinHashSignature) {
        for (band_idx, chunk) in signature.values.chunks(self.rows_per_band).enumerate() {
            if band_idx >= self.bands {
                break;
            }
            self.buckets[band_idx]
                .entry(band_key(band_idx, chunk))
                .or_default()
                .push(doc_id);
        }
    }

    pub fn bands(&self) -> usize {
        self.bands
    }
}

fn band_key(band_idx: usize, rows: &[u64]) -> u64 {
    // Salt with the band index so identical row values in different bands do
    // not alias to one bucket key space.
    let mut bytes = Vec::with_capacity(rows.len() * 8);
    for v in rows {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    xxh3_64_with_seed(&bytes, band_idx as u64)
}
