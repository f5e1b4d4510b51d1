//! MinHash signatures for Jaccard similarity estimation.
//!
//! For each hash function `h_i` in a fixed family, the signature records
//! `min_{x in S} h_i(x)`. The probability that two sets agree at position `i`
//! equals their Jaccard similarity, so the fraction of agreeing positions is
//! an unbiased estimate of `J(A, B)` — usable long after the shingle sets
//! themselves are gone.

use crate::shingle::ShingleSet;
use xxhash_rust::xxh3::xxh3_64_with_seed;

/// A fixed family of `k` seeded hash functions.
///
/// The family must be identical for every document in a run; signatures from
/// different families are not comparable. Seeds are derived from one run seed
/// via an LCG, so the whole family is reproducible from `(k, seed)`.
#[derive(Debug, Clone)]
pub struct MinHasher {
    seeds: Vec<u64>,
}

impl MinHasher {
    pub fn new(signature_len: usize, seed: u64) -> Self {
        let mut seeds = Vec::with_capacity(signature_len);
        let mut state = seed;
        for _ in 0..signature_len {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            seeds.push(state);
        }
        Self { seeds }
    }

    /// Signature length `k`.
    pub fn signature_len(&self) -> usize {
        self.seeds.len()
    }

    /// Compute the signature: per-seed minimum over every shingle.
    ///
    /// An empty shingle set yields the all-sentinel degenerate signature; the
    /// pipeline accepts such documents unconditionally instead of comparing
    /// them (see [`MinHashSignature::is_degenerate`]).
    pub fn sign(&self, shingles: &ShingleSet) -> MinHashSignature {
        let mut values = vec![u64::MAX; self.seeds.len()];
        for &shingle in shingles {
            let bytes = shingle.to_le_bytes();
            for (slot, &seed) in values.iter_mut().zip(self.seeds.iter()) {
                let h = xxh3_64_with_seed(&bytes, seed);
                if h < *slot {
                    *slot = h;
                }
            }
        }
        MinHashSignature { values }
    }
}

/// Ordered `k`-length vector of per-function minima.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHashSignature {
    pub values: Vec<u64>,
}

impl MinHashSignature {
    /// True when produced from an empty shingle set (no content to judge).
    pub fn is_degenerate(&self) -> bool {
        self.values.iter().all(|&v| v == u64::MAX)
    }

    /// Estimated Jaccard similarity: fraction of agreeing positions.
    pub fn estimate_jaccard(&self, other: &Self) -> f64 {
        if self.values.len() != other.values.len() || self.values.is_empty() {
            return 0.0;
        }
        let matches = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| a == b)
            .count();
        matches as f64 / self.values.len() as f64
    }
}
