//! End-to-end pipeline contracts: gating, dedup, degenerate documents,
//! classifier retry. Offline, no model endpoint — test doubles implement the
//! collaborator traits directly.

use corpusclean::pipeline::Pipeline;
use corpusclean_core::{
    Classifier, DocId, Document, Error, Extractor, OutputSink, PipelineConfig, RawPage,
    RejectReason, Result,
};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Treats the "html" field as already-extracted plain text.
struct Passthrough;

impl Extractor for Passthrough {
    fn extract(&self, id: DocId, page: &RawPage) -> Result<Document> {
        Ok(Document::new(id, page.html.clone()))
    }
}

/// Scores by lookup; counts calls so tests can assert gate ordering.
struct KeywordClassifier {
    reject_marker: &'static str,
    calls: AtomicU32,
}

impl KeywordClassifier {
    fn new(reject_marker: &'static str) -> Self {
        Self {
            reject_marker,
            calls: AtomicU32::new(0),
        }
    }
}

#[async_trait::async_trait]
impl Classifier for KeywordClassifier {
    async fn score(&self, text: &str) -> Result<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if text.contains(self.reject_marker) {
            Ok(0.1)
        } else {
            Ok(0.95)
        }
    }
}

/// Fails transiently `failures` times, then scores 1.0.
struct FlakyClassifier {
    failures: u32,
    calls: AtomicU32,
}

#[async_trait::async_trait]
impl Classifier for FlakyClassifier {
    async fn score(&self, _text: &str) -> Result<f64> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            Err(Error::ClassifierUnavailable("transient outage".into()))
        } else {
            Ok(1.0)
        }
    }
}

#[derive(Default)]
struct VecSink {
    docs: Vec<Document>,
}

impl OutputSink for VecSink {
    fn append(&mut self, doc: &Document) -> Result<()> {
        self.docs.push(doc.clone());
        Ok(())
    }
}

fn page(id: DocId, text: &str) -> RawPage {
    RawPage {
        id: Some(id),
        url: None,
        html: text.to_string(),
    }
}

fn test_config() -> PipelineConfig {
    PipelineConfig {
        shingle_width: 3,
        signature_len: 128,
        bands: 32,
        rows_per_band: 4,
        similarity_threshold: 0.8,
        min_confidence: 0.5,
        retry_limit: 2,
        classifier_timeout_ms: 2_000,
        // Sequential completion order keeps first-seen-wins deterministic.
        worker_count: 1,
        ..Default::default()
    }
}

#[tokio::test]
async fn near_duplicate_is_rejected_end_to_end() {
    let pipeline = Pipeline::new(
        test_config(),
        Arc::new(Passthrough),
        Arc::new(KeywordClassifier::new("\u{0}")),
    )
    .unwrap();
    let pages = vec![
        page(0, "The cat sat on the mat."),
        page(1, "The cat sat on the mat!"),
        page(2, "A totally different sentence about astrophysics."),
    ];
    let mut sink = VecSink::default();
    let report = pipeline.run(pages, &mut sink).await.unwrap();

    let emitted: Vec<DocId> = sink.docs.iter().map(|d| d.id).collect();
    assert_eq!(emitted, vec![0, 2], "docs 1 and 3 survive");
    assert_eq!(report.stats.emitted, 2);
    assert_eq!(report.stats.near_duplicates, 1);
    assert_eq!(report.rejections.len(), 1);
    assert_eq!(report.rejections[0].id, 1);
    assert_eq!(report.rejections[0].reason, RejectReason::NearDuplicate);
}

#[tokio::test]
async fn duplicate_cluster_keeps_exactly_one_under_parallelism() {
    // Which member survives depends on completion order; that one survives
    // and the rest are duplicates is order-independent.
    let cfg = PipelineConfig {
        worker_count: 4,
        ..test_config()
    };
    let pipeline = Pipeline::new(
        cfg,
        Arc::new(Passthrough),
        Arc::new(KeywordClassifier::new("\u{0}")),
    )
    .unwrap();
    let pages = vec![
        page(0, "The cat sat on the mat."),
        page(1, "The cat sat on the mat!"),
        page(2, "The cat sat on the mat"),
        page(3, "A totally different sentence about astrophysics."),
    ];
    let mut sink = VecSink::default();
    let report = pipeline.run(pages, &mut sink).await.unwrap();

    assert_eq!(report.stats.emitted, 2);
    assert_eq!(report.stats.near_duplicates, 2);
    assert!(sink.docs.iter().any(|d| d.id == 3));
}

#[tokio::test]
async fn low_relevance_never_reaches_signing() {
    let classifier = Arc::new(KeywordClassifier::new("gossip"));
    let pipeline = Pipeline::new(test_config(), Arc::new(Passthrough), classifier.clone())
        .unwrap();
    let pages = vec![
        page(0, "A careful study of stellar nucleosynthesis pathways."),
        page(1, "Celebrity gossip roundup for the summer season."),
    ];
    let mut sink = VecSink::default();
    let report = pipeline.run(pages, &mut sink).await.unwrap();

    assert_eq!(classifier.calls.load(Ordering::SeqCst), 2);
    assert_eq!(report.stats.classifier_rejected, 1);
    // The gate runs before shingling/signing: only the accepted document was signed.
    assert_eq!(report.stats.signed, 1);
    assert_eq!(sink.docs.len(), 1);
    assert_eq!(sink.docs[0].id, 0);
    assert_eq!(report.rejections[0].reason, RejectReason::LowRelevance);
}

#[tokio::test]
async fn degenerate_documents_bypass_dedup() {
    let pipeline = Pipeline::new(
        test_config(),
        Arc::new(Passthrough),
        Arc::new(KeywordClassifier::new("\u{0}")),
    )
    .unwrap();
    // Both empty: each has an empty shingle set, and they must NOT be treated
    // as duplicates of each other.
    let pages = vec![page(0, ""), page(1, "")];
    let mut sink = VecSink::default();
    let report = pipeline.run(pages, &mut sink).await.unwrap();

    assert_eq!(report.stats.degenerate_accepted, 2);
    assert_eq!(report.stats.near_duplicates, 0);
    assert_eq!(sink.docs.len(), 2);
}

#[tokio::test]
async fn transient_classifier_failure_is_retried() {
    let classifier = Arc::new(FlakyClassifier {
        failures: 2,
        calls: AtomicU32::new(0),
    });
    let pipeline = Pipeline::new(test_config(), Arc::new(Passthrough), classifier.clone())
        .unwrap();
    let pages = vec![page(0, "A perfectly relevant document about chemistry.")];
    let mut sink = VecSink::default();
    let report = pipeline.run(pages, &mut sink).await.unwrap();

    assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
    assert_eq!(report.stats.emitted, 1);
    assert!(report.rejections.is_empty());
}

#[tokio::test]
async fn exhausted_retries_discard_without_aborting_the_batch() {
    let classifier = Arc::new(FlakyClassifier {
        failures: u32::MAX,
        calls: AtomicU32::new(0),
    });
    let cfg = PipelineConfig {
        retry_limit: 1,
        ..test_config()
    };
    let pipeline = Pipeline::new(cfg, Arc::new(Passthrough), classifier).unwrap();
    let pages = vec![page(0, "Doomed document, the classifier is down.")];
    let mut sink = VecSink::default();
    let report = pipeline.run(pages, &mut sink).await.unwrap();

    assert_eq!(report.stats.emitted, 0);
    assert_eq!(report.stats.extraction_failures, 1);
    assert_eq!(report.rejections[0].reason, RejectReason::ExtractionFailed);
}

#[tokio::test]
async fn mixed_batch_stats_account_for_every_reason() {
    let pipeline = Pipeline::new(
        test_config(),
        Arc::new(Passthrough),
        Arc::new(KeywordClassifier::new("gossip")),
    )
    .unwrap();
    let pages = vec![
        page(0, "The cat sat on the mat."),
        page(1, "Celebrity gossip roundup for the summer season."),
        page(2, "The cat sat on the mat!"),
        page(3, ""),
    ];
    let mut sink = VecSink::default();
    let report = pipeline.run(pages, &mut sink).await.unwrap();

    assert_eq!(report.stats.emitted, 2);
    assert_eq!(report.stats.classifier_rejected, 1);
    assert_eq!(report.stats.near_duplicates, 1);
    assert_eq!(report.stats.degenerate_accepted, 1);
    assert_eq!(report.stats.extraction_failures, 0);
    assert_eq!(
        report.stats.emitted + report.rejections.len() as u64,
        4,
        "every input reaches a terminal state"
    );
}

#[tokio::test]
async fn invalid_configuration_fails_before_processing() {
    let cfg = PipelineConfig {
        bands: 10,
        rows_per_band: 10,
        signature_len: 128,
        ..PipelineConfig::default()
    };
    let err = Pipeline::new(
        cfg,
        Arc::new(Passthrough),
        Arc::new(KeywordClassifier::new("\u{0}")),
    )
    .err()
    .expect("mismatched banding must be fatal");
    assert!(matches!(err, Error::InvalidConfiguration(_)), "{err}");
}

#[tokio::test]
async fn every_input_reaches_a_terminal_state() {
    struct HalfBrokenExtractor;
    impl Extractor for HalfBrokenExtractor {
        fn extract(&self, id: DocId, page: &RawPage) -> Result<Document> {
            if id % 2 == 0 {
                Err(Error::Extraction("no body".into()))
            } else {
                Ok(Document::new(id, page.html.clone()))
            }
        }
    }

    let pipeline = Pipeline::new(
        test_config(),
        Arc::new(HalfBrokenExtractor),
        Arc::new(KeywordClassifier::new("\u{0}")),
    )
    .unwrap();
    let pages: Vec<RawPage> = (0..6)
        .map(|i| page(i, &format!("unique document number {i} with enough words")))
        .collect();
    let mut sink = VecSink::default();
    let report = pipeline.run(pages, &mut sink).await.unwrap();

    let terminal = report.stats.emitted + report.rejections.len() as u64;
    assert_eq!(terminal, 6, "all inputs accounted for");
    assert_eq!(report.stats.extraction_failures, 3);
}
