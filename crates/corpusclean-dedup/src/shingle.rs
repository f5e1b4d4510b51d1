//! Shingling: represent a document as a set of n-gram fingerprints.

use corpusclean_core::ShingleMode;
use std::collections::HashSet;
use xxhash_rust::xxh3::xxh3_64;

/// Set of n-gram hashes for one document. Ephemeral; discarded after signing.
pub type ShingleSet = HashSet<u64>;

/// Split `text` into overlapping `width`-gram windows and hash each window.
///
/// Notes:
/// - Duplicate windows within one document collapse (this is a set).
/// - Fewer tokens than `width` ⇒ the whole document becomes a single shingle.
/// - Zero tokens ⇒ empty set; the caller treats that as a degenerate document.
/// - `width == 0` is rejected by config validation before this is ever called.
pub fn shingle(text: &str, mode: ShingleMode, width: usize) -> ShingleSet {
    debug_assert!(width > 0, "shingle width must be > 0");
    match mode {
        ShingleMode::Word => word_shingles(text, width),
        ShingleMode::Char => char_shingles(text, width),
    }
}

fn word_shingles(text: &str, width: usize) -> ShingleSet {
    let tokens: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();
    let mut out = HashSet::new();
    if tokens.is_empty() {
        return out;
    }
    if tokens.len() < width {
        out.insert(hash_tokens(&tokens));
        return out;
    }
    for window in tokens.windows(width) {
        out.insert(hash_tokens(window));
    }
    out
}

fn char_shingles(text: &str, width: usize) -> ShingleSet {
    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut out = HashSet::new();
    if chars.is_empty() {
        return out;
    }
    if chars.len() < width {
        let s: String = chars.iter().collect();
        out.insert(xxh3_64(s.as_bytes()));
        return out;
    }
    let mut buf = String::with_capacity(width * 4);
    for window in chars.windows(width) {
        buf.clear();
        buf.extend(window.iter());
        out.insert(xxh3_64(buf.as_bytes()));
    }
    out
}

fn hash_tokens(tokens: &[&str]) -> u64 {
    // Join with an unambiguous separator so ["ab","c"] != ["a","bc"].
    let mut buf = Vec::new();
    for (i, t) in tokens.iter().enumerate() {
        if i > 0 {
            buf.push(0x1f);
        }
        buf.extend_from_slice(t.as_bytes());
    }
    xxh3_64(&buf)
}
