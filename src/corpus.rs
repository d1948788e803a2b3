//! JSON-file corpus store.
//!
//! The knowledge base is a single JSON array of
//! `{"filename", "content", ...}` objects written by the ingestion commands.
//! [`JsonCorpus`] re-reads it on every [`CorpusStore::load`]; there is no
//! in-process cache to invalidate.
//!
//! Fields other than `filename` and `content` (`path`, `type`, ...) are kept
//! verbatim when entries are upserted.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use campus_assist_core::models::Document;
use campus_assist_core::store::CorpusStore;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// One stored entry, including fields the pipeline does not read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub content: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CorpusEntry {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// Outcome of an upsert batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct UpsertStats {
    pub added: usize,
    pub updated: usize,
}

#[derive(Debug, Clone)]
pub struct JsonCorpus {
    path: PathBuf,
}

impl JsonCorpus {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored entry. A missing file is an empty corpus.
    pub async fn read_entries(&self) -> Result<Vec<CorpusEntry>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Knowledge base absent, using empty corpus");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read knowledge base: {}", self.path.display())
                })
            }
        };

        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse knowledge base: {}", self.path.display()))
    }

    /// Replace the stored corpus. Writes to a sibling temp file and renames
    /// it into place so concurrent readers never see a partial file.
    pub async fn write_entries(&self, entries: &[CorpusEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }

    /// Insert or replace entries by exact filename and persist the result.
    ///
    /// A replaced entry keeps its position; its content and extra fields are
    /// overwritten by the newer entry.
    pub async fn upsert(&self, incoming: Vec<CorpusEntry>) -> Result<UpsertStats> {
        let mut entries = self.read_entries().await?;
        let stats = merge_entries(&mut entries, incoming);
        self.write_entries(&entries).await?;
        Ok(stats)
    }
}

/// Merge `incoming` into `entries` by exact filename, latest wins.
pub fn merge_entries(entries: &mut Vec<CorpusEntry>, incoming: Vec<CorpusEntry>) -> UpsertStats {
    let mut stats = UpsertStats::default();
    for entry in incoming {
        match entries.iter_mut().find(|e| e.filename == entry.filename) {
            Some(existing) => {
                existing.content = entry.content;
                existing.extra.extend(entry.extra);
                stats.updated += 1;
            }
            None => {
                entries.push(entry);
                stats.added += 1;
            }
        }
    }
    stats
}

#[async_trait]
impl CorpusStore for JsonCorpus {
    async fn load(&self) -> Result<Vec<Document>> {
        let entries = self.read_entries().await?;
        let mut docs: Vec<Document> = Vec::with_capacity(entries.len());
        for entry in entries {
            if entry.filename.trim().is_empty() {
                warn!(path = %self.path.display(), "Skipping knowledge base entry without filename");
                continue;
            }
            campus_assist_core::models::upsert(
                &mut docs,
                Document::new(entry.filename, entry.content),
            );
        }
        Ok(docs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = JsonCorpus::new(dir.path().join("knowledge_base.json"));
        assert!(corpus.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge_base.json");
        std::fs::write(&path, "{ not an array").unwrap();
        assert!(JsonCorpus::new(path).load().await.is_err());
    }

    #[tokio::test]
    async fn load_ignores_extra_fields_and_collapses_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("knowledge_base.json");
        std::fs::write(
            &path,
            r#"[
                {"filename": "a.docx", "path": "/x/a.docx", "type": "docx", "content": "eski"},
                {"filename": "", "content": "yetim"},
                {"filename": "a.docx", "content": "yeni"}
            ]"#,
        )
        .unwrap();

        let docs = JsonCorpus::new(path).load().await.unwrap();
        assert_eq!(docs, vec![Document::new("a.docx", "yeni")]);
    }

    #[tokio::test]
    async fn upsert_replaces_in_place_and_keeps_extras() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = JsonCorpus::new(dir.path().join("kb").join("knowledge_base.json"));

        let first = corpus
            .upsert(vec![
                CorpusEntry::new("a.docx", "bir").with_extra("type", "docx"),
                CorpusEntry::new("b.xlsx", "iki"),
            ])
            .await
            .unwrap();
        assert_eq!(first, UpsertStats { added: 2, updated: 0 });

        let second = corpus
            .upsert(vec![CorpusEntry::new("a.docx", "güncel")])
            .await
            .unwrap();
        assert_eq!(second, UpsertStats { added: 0, updated: 1 });

        let entries = corpus.read_entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "a.docx");
        assert_eq!(entries[0].content, "güncel");
        assert_eq!(entries[0].extra.get("type"), Some(&Value::from("docx")));
    }

    #[tokio::test]
    async fn every_load_sees_the_current_file() {
        let dir = tempfile::tempdir().unwrap();
        let corpus = JsonCorpus::new(dir.path().join("knowledge_base.json"));
        corpus.upsert(vec![CorpusEntry::new("a.docx", "x")]).await.unwrap();
        assert_eq!(corpus.load().await.unwrap().len(), 1);
        corpus.upsert(vec![CorpusEntry::new("b.docx", "y")]).await.unwrap();
        assert_eq!(corpus.load().await.unwrap().len(), 2);
    }
}
