//! Append-only JSONL output sink.

use corpusclean_core::{Document, Error, OutputSink, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes one JSON document per line, in commit order.
///
/// Flushed on every append: a crash mid-run must not lose documents that the
/// dedup index already considers committed.
#[derive(Debug)]
pub struct JsonlSink {
    out: BufWriter<File>,
}

impl JsonlSink {
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::Sink(format!("open {}: {e}", path.display())))?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }
}

impl OutputSink for JsonlSink {
    fn append(&mut self, doc: &Document) -> Result<()> {
        let line = serde_json::to_string(doc).map_err(|e| Error::Sink(e.to_string()))?;
        self.out
            .write_all(line.as_bytes())
            .and_then(|_| self.out.write_all(b"\n"))
            .and_then(|_| self.out.flush())
            .map_err(|e| Error::Sink(e.to_string()))
    }
}
