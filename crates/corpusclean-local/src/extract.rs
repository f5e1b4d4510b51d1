//! Heuristic HTML → candidate-text extraction.
//!
//! Notes:
//! - This is intentionally "good enough" and deterministic, not a full
//!   readability engine: html2text conversion followed by paragraph-level
//!   boilerplate filtering (length, stopword ratio, citation/contact/ad
//!   markers).
//! - Callers wanting a different engine implement
//!   [`corpusclean_core::Extractor`] themselves.

use corpusclean_core::{DocId, Document, Error, Extractor, RawPage, Result};
use html_scraper::{Html, Selector};
use std::io::Cursor;

/// Paragraph-filtering knobs.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Paragraphs shorter than this (chars) are boilerplate (nav, captions).
    pub min_paragraph_chars: usize,
    /// Paragraphs where function words dominate beyond this ratio are dropped.
    pub max_stopword_ratio: f64,
    /// Render width passed to html2text.
    pub render_width: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_paragraph_chars: 50,
            max_stopword_ratio: 0.6,
            render_width: 200,
        }
    }
}

/// html2text-based extractor with academic-page boilerplate heuristics.
#[derive(Debug, Clone, Default)]
pub struct HtmlExtractor {
    config: ExtractorConfig,
}

impl HtmlExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn keep_paragraph(&self, para: &str) -> bool {
        let trimmed = para.trim();
        if trimmed.chars().count() < self.config.min_paragraph_chars {
            return false;
        }
        let lower = trimmed.to_lowercase();
        if is_reference_block(&lower) || is_contact_block(&lower) || is_ad_block(&lower) {
            return false;
        }
        let tokens: Vec<&str> = lower.split_whitespace().collect();
        if tokens.is_empty() {
            return false;
        }
        let stop = tokens.iter().filter(|t| is_stopword(t)).count();
        (stop as f64 / tokens.len() as f64) <= self.config.max_stopword_ratio
    }
}

impl Extractor for HtmlExtractor {
    fn extract(&self, id: DocId, page: &RawPage) -> Result<Document> {
        if page.html.trim().is_empty() {
            return Err(Error::Extraction("empty page body".into()));
        }
        let text = html2text::from_read(
            Cursor::new(page.html.as_bytes()),
            self.config.render_width,
        )
        .map_err(|e| Error::Extraction(format!("html render failed: {e}")))?;

        let paragraphs: Vec<&str> = text.split("\n\n").map(str::trim).collect();
        let kept: Vec<&str> = paragraphs
            .iter()
            .copied()
            .filter(|p| self.keep_paragraph(p))
            .collect();
        tracing::debug!(
            id,
            total = paragraphs.len(),
            kept = kept.len(),
            "paragraph filtering"
        );
        if kept.is_empty() {
            return Err(Error::Extraction("no content paragraphs survived".into()));
        }

        let mut doc = Document::new(id, kept.join("\n\n"));
        doc.source_url = page.url.clone();
        if let Some(title) = page_title(&page.html) {
            doc.metadata.insert("title".into(), title);
        }
        Ok(doc)
    }
}

fn page_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let sel = Selector::parse("title").ok()?;
    let title = doc
        .select(&sel)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    if title.is_empty() {
        None
    } else {
        Some(title)
    }
}

/// Reference/bibliography tails carry no body content.
fn is_reference_block(lower: &str) -> bool {
    lower.starts_with("references")
        || lower.starts_with("bibliography")
        || lower.contains("doi:")
        || bracket_citation_density(lower) > 0.3
}

fn bracket_citation_density(lower: &str) -> f64 {
    let tokens: Vec<&str> = lower.split_whitespace().collect();
    if tokens.is_empty() {
        return 0.0;
    }
    let cites = tokens
        .iter()
        .filter(|t| t.starts_with('[') && t.contains(']'))
        .count();
    cites as f64 / tokens.len() as f64
}

/// Author-contact footers (emails, honorifics).
fn is_contact_block(lower: &str) -> bool {
    lower.contains("corresponding author")
        || lower.contains("email:")
        || (lower.contains('@') && (lower.contains(".edu") || lower.contains(".ac.")))
}

fn is_ad_block(lower: &str) -> bool {
    lower.contains("sponsored") || lower.contains("advertisement")
}

fn is_stopword(token: &str) -> bool {
    // Small English function-word set; enough for a ratio heuristic, not a
    // full stoplist.
    matches!(
        token,
        "the" | "a" | "an" | "and" | "or" | "but" | "of" | "to" | "in" | "on" | "at" | "for"
            | "with" | "by" | "from" | "as" | "is" | "are" | "was" | "were" | "be" | "been"
            | "it" | "its" | "this" | "that" | "these" | "those" | "we" | "you" | "they" | "he"
            | "she" | "i" | "not" | "no" | "so" | "if" | "then" | "than" | "there" | "here"
            | "up" | "down" | "out" | "off" | "over" | "under" | "more" | "most" | "some"
            | "such" | "our" | "your" | "their" | "his" | "her" | "my" | "me" | "him" | "them"
            | "can" | "will" | "do" | "does" | "did" | "have" | "has" | "had"
    )
}
