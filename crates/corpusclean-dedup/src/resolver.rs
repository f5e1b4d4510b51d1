//! Duplicate resolution over banding candidates.

use crate::minhash::MinHashSignature;
use corpusclean_core::DocId;
use std::collections::HashMap;

/// Signatures of accepted documents, keyed by id.
///
/// Owned by the pipeline orchestrator alongside the banded index; the
/// resolver only reads it.
pub type SignatureStore = HashMap<DocId, MinHashSignature>;

/// First committed candidate whose estimated similarity strictly exceeds
/// `threshold`, or `None`.
///
/// Notes:
/// - Binary decision only; no "most similar" ranking. Candidate order is
///   arbitrary and the first hit short-circuits.
/// - Boundary equality (`estimate == threshold`) is non-duplicate.
/// - A candidate id missing from the store is skipped; the caller maintains
///   store and index together, so that indicates a candidate committed by a
///   different run, not a corrupt state worth aborting over.
pub fn find_duplicate(
    signature: &MinHashSignature,
    candidates: &[DocId],
    store: &SignatureStore,
    threshold: f64,
) -> Option<DocId> {
    for &id in candidates {
        if let Some(other) = store.get(&id) {
            if signature.estimate_jaccard(other) > threshold {
                return Some(id);
            }
        }
    }
    None
}
