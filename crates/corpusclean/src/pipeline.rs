//! Pipeline orchestrator.
//!
//! Per document the progression is strictly sequential:
//! extract → classifier gate → shingle → sign → dedup check → emit/reject.
//! The expensive, purely-functional stages run concurrently across documents
//! in a bounded worker pool; their results feed a bounded channel into a
//! single commit lane that owns the banded index, the signature store and the
//! sink. A later document therefore only ever sees earlier *committed*
//! documents, never documents still in flight.
//!
//! When near-duplicate clusters exist the surviving representative depends on
//! completion order (first committed wins). That nondeterminism is a property
//! of the design, not a bug: any one representative of a cluster is an
//! acceptable corpus member.

use corpusclean_core::{
    Classifier, DocId, Document, Error, Extractor, OutputSink, PipelineConfig, RawPage,
    RejectReason, Result,
};
use corpusclean_dedup::{find_duplicate, shingle, BandedIndex, MinHasher, SignatureStore};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const RETRY_BACKOFF_BASE_MS: u64 = 100;

/// Per-run counters, reported at the end of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    pub input_pages: u64,
    pub extracted: u64,
    pub classifier_rejected: u64,
    /// Documents that reached shingling/signing (gate-accepted).
    pub signed: u64,
    /// Too little content to shingle; emitted without a dedup check.
    pub degenerate_accepted: u64,
    pub near_duplicates: u64,
    pub extraction_failures: u64,
    pub emitted: u64,
}

/// One discarded document and why.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub id: DocId,
    pub reason: RejectReason,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub stats: PipelineStats,
    pub rejections: Vec<Rejection>,
}

/// What the parallel stage hands to the commit lane.
enum StageOutcome {
    /// Gate-accepted and signed; awaiting the dedup decision.
    Ready {
        doc: Document,
        signature: corpusclean_dedup::MinHashSignature,
    },
    /// Empty shingle set: not enough content to judge, accept unconditionally.
    Degenerate { doc: Document },
    Rejected(Rejection),
}

pub struct Pipeline {
    config: PipelineConfig,
    extractor: Arc<dyn Extractor>,
    classifier: Arc<dyn Classifier>,
}

impl Pipeline {
    /// Fails fast on an invalid configuration; nothing is processed.
    pub fn new(
        config: PipelineConfig,
        extractor: Arc<dyn Extractor>,
        classifier: Arc<dyn Classifier>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            extractor,
            classifier,
        })
    }

    /// Run the whole batch. Every input page reaches a terminal state;
    /// per-document failures are recorded, never fatal.
    pub async fn run(&self, pages: Vec<RawPage>, sink: &mut dyn OutputSink) -> Result<RunReport> {
        let cfg = self.config.clone();
        let hasher = Arc::new(MinHasher::new(cfg.signature_len, cfg.hash_seed));
        let mut index = BandedIndex::new(cfg.bands, cfg.rows_per_band);
        let total = pages.len();
        info!(
            pages = total,
            bands = index.bands(),
            rows_per_band = cfg.rows_per_band,
            "pipeline run starting"
        );

        let (tx, mut rx) = mpsc::channel::<StageOutcome>(cfg.channel_capacity);

        // Parallel stage: extract / classify / shingle / sign, bounded fan-out.
        let worker_cfg = Arc::new(cfg.clone());
        let extractor = Arc::clone(&self.extractor);
        let classifier = Arc::clone(&self.classifier);
        let producer = tokio::spawn(async move {
            let mut results = stream::iter(pages.into_iter().enumerate().map(|(seq, page)| {
                let cfg = Arc::clone(&worker_cfg);
                let extractor = Arc::clone(&extractor);
                let classifier = Arc::clone(&classifier);
                let hasher = Arc::clone(&hasher);
                async move {
                    process_page(seq as DocId, page, &cfg, &*extractor, &*classifier, &hasher)
                        .await
                }
            }))
            .buffer_unordered(worker_cfg.worker_count);
            while let Some(outcome) = results.next().await {
                if tx.send(outcome).await.is_err() {
                    break;
                }
            }
        });

        // Commit lane: the only place the index, store and sink are touched.
        let mut store = SignatureStore::new();
        let mut stats = PipelineStats {
            input_pages: total as u64,
            ..Default::default()
        };
        let mut rejections = Vec::new();

        while let Some(outcome) = rx.recv().await {
            match outcome {
                StageOutcome::Ready { doc, signature } => {
                    stats.extracted += 1;
                    stats.signed += 1;
                    let candidates = index.candidates(&signature);
                    match find_duplicate(
                        &signature,
                        &candidates,
                        &store,
                        cfg.similarity_threshold,
                    ) {
                        Some(dup_of) => {
                            debug!(id = doc.id, dup_of, "near-duplicate rejected");
                            stats.near_duplicates += 1;
                            rejections.push(Rejection {
                                id: doc.id,
                                reason: RejectReason::NearDuplicate,
                                detail: format!("near-duplicate of {dup_of}"),
                            });
                        }
                        None => {
                            sink.append(&doc)?;
                            index.commit(doc.id, &signature);
                            store.insert(doc.id, signature);
                            stats.emitted += 1;
                        }
                    }
                }
                StageOutcome::Degenerate { doc } => {
                    // Emitted but never committed: an all-sentinel signature
                    // would spuriously match every other degenerate document.
                    stats.extracted += 1;
                    stats.degenerate_accepted += 1;
                    stats.emitted += 1;
                    sink.append(&doc)?;
                }
                StageOutcome::Rejected(rejection) => {
                    // Dedup rejections are constructed in this lane; workers
                    // only report relevance and extraction failures.
                    debug_assert_ne!(rejection.reason, RejectReason::NearDuplicate);
                    if rejection.reason == RejectReason::LowRelevance {
                        stats.extracted += 1;
                        stats.classifier_rejected += 1;
                    } else {
                        stats.extraction_failures += 1;
                    }
                    rejections.push(rejection);
                }
            }
        }

        producer
            .await
            .map_err(|e| Error::Extraction(format!("worker pool panicked: {e}")))?;

        info!(
            emitted = stats.emitted,
            near_duplicates = stats.near_duplicates,
            classifier_rejected = stats.classifier_rejected,
            extraction_failures = stats.extraction_failures,
            "pipeline run finished"
        );
        Ok(RunReport { stats, rejections })
    }
}

/// The purely-functional per-document stages. No shared mutable state.
async fn process_page(
    seq: DocId,
    page: RawPage,
    cfg: &PipelineConfig,
    extractor: &dyn Extractor,
    classifier: &dyn Classifier,
    hasher: &MinHasher,
) -> StageOutcome {
    let id = page.id.unwrap_or(seq);

    let doc = match extractor.extract(id, &page) {
        Ok(doc) => doc,
        Err(e) => {
            debug!(id, error = %e, "extraction failed");
            return StageOutcome::Rejected(Rejection {
                id,
                reason: RejectReason::ExtractionFailed,
                detail: e.to_string(),
            });
        }
    };

    let score = match score_with_retry(classifier, &doc.text, cfg).await {
        Ok(score) => score,
        Err(e) => {
            // Retries exhausted; discard like an extraction failure so the
            // batch keeps moving.
            warn!(id, error = %e, "classifier unavailable after retries");
            return StageOutcome::Rejected(Rejection {
                id,
                reason: RejectReason::ExtractionFailed,
                detail: e.to_string(),
            });
        }
    };
    if score < cfg.min_confidence {
        debug!(id, score, "below confidence gate");
        return StageOutcome::Rejected(Rejection {
            id,
            reason: RejectReason::LowRelevance,
            detail: format!("score {score:.3} < {:.3}", cfg.min_confidence),
        });
    }

    let shingles = shingle(&doc.text, cfg.shingle_mode, cfg.shingle_width);
    if shingles.is_empty() {
        return StageOutcome::Degenerate { doc };
    }
    let signature = hasher.sign(&shingles);
    StageOutcome::Ready { doc, signature }
}

/// Classifier call with timeout; transient failures back off exponentially up
/// to `retry_limit` retries.
async fn score_with_retry(
    classifier: &dyn Classifier,
    text: &str,
    cfg: &PipelineConfig,
) -> Result<f64> {
    let mut attempt: u32 = 0;
    loop {
        let call = tokio::time::timeout(cfg.classifier_timeout(), classifier.score(text)).await;
        let err = match call {
            Ok(Ok(score)) => return Ok(score),
            Ok(Err(e @ Error::ClassifierUnavailable(_))) => e,
            Ok(Err(e)) => return Err(e),
            Err(_) => Error::ClassifierUnavailable(format!(
                "timed out after {}ms",
                cfg.classifier_timeout_ms
            )),
        };
        if attempt >= cfg.retry_limit {
            return Err(err);
        }
        let backoff = Duration::from_millis(RETRY_BACKOFF_BASE_MS << attempt.min(6));
        debug!(attempt, error = %err, "classifier retry");
        tokio::time::sleep(backoff).await;
        attempt += 1;
    }
}
