//! Local implementations of the corpusclean collaborator traits:
//! heuristic HTML extraction, an HTTP classifier adapter, and a JSONL sink.

pub mod classify;
pub mod extract;
pub mod sink;

pub use classify::{FixedClassifier, HttpClassifier};
pub use extract::{ExtractorConfig, HtmlExtractor};
pub use sink::JsonlSink;
