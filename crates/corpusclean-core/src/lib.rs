use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("extraction failed: {0}")]
    Extraction(String),
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),
    #[error("sink error: {0}")]
    Sink(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Stable identifier for a document within one pipeline run.
pub type DocId = u64;

/// A boilerplate-free candidate document produced by an extractor.
///
/// Immutable once created; metadata is opaque passthrough and never inspected
/// by the pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub text: String,
    pub source_url: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    pub fn new(id: DocId, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            source_url: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// Why a document was dropped from the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    LowRelevance,
    NearDuplicate,
    ExtractionFailed,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::LowRelevance => "low_relevance",
            RejectReason::NearDuplicate => "near_duplicate",
            RejectReason::ExtractionFailed => "extraction_failed",
        }
    }
}

/// Shingling granularity.
///
/// Word shingles are the usual choice for prose corpora; character shingles
/// behave better for languages without whitespace word boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShingleMode {
    Word,
    Char,
}

/// Tuning knobs for one pipeline run.
///
/// The hash family implied by `signature_len` is fixed for the whole run:
/// signatures are only comparable when produced by the same family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub shingle_mode: ShingleMode,
    /// Tokens (or chars) per shingle window.
    pub shingle_width: usize,
    /// MinHash signature length `k`.
    pub signature_len: usize,
    /// LSH bands `b`; `b * rows_per_band` must equal `signature_len`.
    pub bands: usize,
    /// Rows per LSH band `r`.
    pub rows_per_band: usize,
    /// Estimated-Jaccard cutoff; strictly-greater counts as duplicate.
    pub similarity_threshold: f64,
    /// Minimum classifier confidence to keep a document.
    pub min_confidence: f64,
    /// Retries for a transient classifier failure before giving up.
    pub retry_limit: u32,
    /// Seed for the MinHash hash family; fixed for the whole run.
    pub hash_seed: u64,
    /// Per-call classifier timeout.
    pub classifier_timeout_ms: u64,
    /// Parallelism for the extract/classify/sign stages.
    pub worker_count: usize,
    /// Bound on the queue feeding the commit lane (backpressure).
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            shingle_mode: ShingleMode::Word,
            shingle_width: 3,
            signature_len: 128,
            bands: 32,
            rows_per_band: 4,
            similarity_threshold: 0.8,
            min_confidence: 0.5,
            retry_limit: 2,
            hash_seed: 42,
            classifier_timeout_ms: 10_000,
            worker_count: 8,
            channel_capacity: 64,
        }
    }
}

impl PipelineConfig {
    /// Validate once at startup; any violation is fatal before processing begins.
    pub fn validate(&self) -> Result<()> {
        if self.shingle_width == 0 {
            return Err(Error::InvalidConfiguration(
                "shingle_width must be > 0".into(),
            ));
        }
        if self.signature_len == 0 {
            return Err(Error::InvalidConfiguration(
                "signature_len must be > 0".into(),
            ));
        }
        if self.bands == 0 || self.rows_per_band == 0 {
            return Err(Error::InvalidConfiguration(
                "bands and rows_per_band must be > 0".into(),
            ));
        }
        if self.bands * self.rows_per_band != self.signature_len {
            return Err(Error::InvalidConfiguration(format!(
                "bands * rows_per_band must equal signature_len ({} * {} != {})",
                self.bands, self.rows_per_band, self.signature_len
            )));
        }
        if !(0.0..1.0).contains(&self.similarity_threshold) {
            return Err(Error::InvalidConfiguration(
                "similarity_threshold must be in [0, 1)".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(Error::InvalidConfiguration(
                "min_confidence must be in [0, 1]".into(),
            ));
        }
        if self.worker_count == 0 || self.channel_capacity == 0 {
            return Err(Error::InvalidConfiguration(
                "worker_count and channel_capacity must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }
}

/// A raw scraped page before extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPage {
    #[serde(default)]
    pub id: Option<DocId>,
    #[serde(default)]
    pub url: Option<String>,
    pub html: String,
}

/// Turns raw HTML into a boilerplate-free candidate document, or reports
/// that the page has no extractable body.
pub trait Extractor: Send + Sync {
    fn extract(&self, id: DocId, page: &RawPage) -> Result<Document>;
}

/// Relevance scorer for candidate text.
///
/// Implementations typically front a learned model behind an endpoint; the
/// score is a confidence in [0, 1]. Transport failures surface as
/// [`Error::ClassifierUnavailable`] and are retried by the orchestrator.
#[async_trait::async_trait]
pub trait Classifier: Send + Sync {
    async fn score(&self, text: &str) -> Result<f64>;
}

/// Append-only destination for accepted documents, in commit order.
pub trait OutputSink: Send {
    fn append(&mut self, doc: &Document) -> Result<()>;
}
