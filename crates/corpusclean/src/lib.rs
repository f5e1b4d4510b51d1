//! Pipeline orchestration for corpusclean.
//!
//! Re-exports the backend-agnostic types from `corpusclean-core` so most
//! callers only need this crate.

pub mod pipeline;

pub use corpusclean_core::*;
pub use pipeline::{Pipeline, PipelineStats, Rejection, RunReport};
