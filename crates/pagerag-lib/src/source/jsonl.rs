use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::DOCUMENT_EXTENSION;
use crate::error::RagError;
use crate::pipeline::corpus::DocumentPage;
use crate::source::DocumentSource;
use crate::source::clean::clean_text;

/// One extracted page as written by the PDF extraction step.
#[derive(Debug, Deserialize)]
struct PageRecord {
    source_path: String,
    page_index: usize,
    raw_text: String,
}

/// Document source backed by a JSONL file of extracted pages.
///
/// Each line is `{"source_path": ..., "page_index": ..., "raw_text": ...}`.
/// Only `.pdf` paths under the requested prefix are returned; documents are
/// numbered in first-seen order.
pub struct JsonlPageSource {
    path: PathBuf,
    clean: bool,
}

impl JsonlPageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            clean: true,
        }
    }

    /// Keep page text exactly as extracted.
    #[must_use]
    pub fn raw(mut self) -> Self {
        self.clean = false;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_pages(&self, prefix: &str) -> anyhow::Result<Vec<DocumentPage>> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open page listing {}", self.path.display()))?;
        let reader = BufReader::new(file);

        let mut documents: Vec<String> = Vec::new();
        let mut pages = Vec::new();
        let mut skipped = 0usize;

        for (line_index, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read line {}", line_index + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: PageRecord = serde_json::from_str(&line)
                .with_context(|| format!("Malformed page record on line {}", line_index + 1))?;

            if !record.source_path.starts_with(prefix)
                || !has_document_extension(&record.source_path)
            {
                skipped += 1;
                continue;
            }

            let document_index = match documents.iter().position(|d| *d == record.source_path) {
                Some(idx) => idx,
                None => {
                    documents.push(record.source_path.clone());
                    documents.len() - 1
                }
            };

            let raw_text = if self.clean {
                clean_text(&record.raw_text)
            } else {
                record.raw_text
            };

            pages.push(DocumentPage {
                source_path: record.source_path,
                document_index,
                page_index: record.page_index,
                raw_text,
            });
        }

        if documents.is_empty() {
            warn!(prefix, path = %self.path.display(), "No documents matched the prefix");
        }
        debug!(
            documents = documents.len(),
            pages = pages.len(),
            skipped,
            "Listed document pages"
        );

        Ok(pages)
    }
}

impl DocumentSource for JsonlPageSource {
    fn list_pages(&self, prefix: &str) -> Result<Vec<DocumentPage>, RagError> {
        self.read_pages(prefix).map_err(|e| RagError::storage(&e))
    }
}

fn has_document_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(&DOCUMENT_EXTENSION[1..]))
}
