//! Core data models shared by the retrieval pipeline.
//!
//! Documents are produced by the ingestion collaborator and are read-only
//! at query time; scored documents are recomputed for every query.

use serde::{Deserialize, Serialize};

/// A single entry of the knowledge base: a stored filename plus the plain
/// text extracted from it.
///
/// The filename is the document's identity and is compared byte-for-byte.
/// Extra fields written by the ingestion tooling (`path`, `type`, ...) are
/// ignored on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    #[serde(default)]
    pub content: String,
}

impl Document {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

/// A document selected for a query, with the score that put it there.
///
/// Override rules use [`FORCED_SCORE`] for the documents they inject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredDocument {
    #[serde(flatten)]
    pub doc: Document,
    pub score: u32,
}

/// Sentinel score assigned to documents forced into context by a rule.
pub const FORCED_SCORE: u32 = 100;

impl ScoredDocument {
    pub fn new(doc: Document, score: u32) -> Self {
        Self { doc, score }
    }

    pub fn forced(filename: &str, content: &str) -> Self {
        Self {
            doc: Document::new(filename, content),
            score: FORCED_SCORE,
        }
    }

    pub fn filename(&self) -> &str {
        &self.doc.filename
    }
}

/// Insert or replace a document by exact filename.
///
/// Keeps the corpus free of byte-identical duplicates: the latest ingestion
/// overwrites the earlier content in place. Returns `true` when an existing
/// entry was replaced.
pub fn upsert(corpus: &mut Vec<Document>, doc: Document) -> bool {
    match corpus.iter_mut().find(|d| d.filename == doc.filename) {
        Some(existing) => {
            existing.content = doc.content;
            true
        }
        None => {
            corpus.push(doc);
            false
        }
    }
}
