//! In-memory [`CorpusStore`] and [`FileStore`] implementations for tests
//! and embedding hosts.
//!
//! Contents sit behind `std::sync::RwLock` so tests can swap the corpus
//! between calls and observe that nothing is cached.

use std::sync::{PoisonError, RwLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use crate::models::Document;

use super::{CorpusStore, FileStore};

/// A corpus held in memory.
#[derive(Default)]
pub struct InMemoryCorpus {
    docs: RwLock<Vec<Document>>,
}

impl InMemoryCorpus {
    pub fn new(docs: Vec<Document>) -> Self {
        Self {
            docs: RwLock::new(docs),
        }
    }

    /// Replace the whole corpus.
    pub fn replace(&self, docs: Vec<Document>) {
        *self.docs.write().unwrap_or_else(PoisonError::into_inner) = docs;
    }
}

#[async_trait]
impl CorpusStore for InMemoryCorpus {
    async fn load(&self) -> Result<Vec<Document>> {
        Ok(self.docs.read().unwrap_or_else(PoisonError::into_inner).clone())
    }
}

/// Named byte blobs held in memory, listed in insertion order.
#[derive(Default)]
pub struct InMemoryFiles {
    files: RwLock<Vec<(String, Vec<u8>)>>,
}

impl InMemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let name = name.into();
        let bytes = bytes.into();
        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        match files.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = bytes,
            None => files.push((name, bytes)),
        }
    }
}

#[async_trait]
impl FileStore for InMemoryFiles {
    async fn list(&self) -> Result<Vec<String>> {
        Ok(self
            .files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(n, _)| n.clone())
            .collect())
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b.clone())
            .ok_or_else(|| anyhow!("file not found: {}", name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn corpus_reflects_replacement() {
        let store = InMemoryCorpus::new(vec![Document::new("a.docx", "a")]);
        assert_eq!(store.load().await.unwrap().len(), 1);
        store.replace(Vec::new());
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn files_list_in_insertion_order_and_read_exact_names() {
        let files = InMemoryFiles::new();
        files.insert("b.pdf", b"pdf".to_vec());
        files.insert("a.docx", b"docx".to_vec());
        assert_eq!(files.list().await.unwrap(), vec!["b.pdf", "a.docx"]);
        assert_eq!(files.read("a.docx").await.unwrap(), b"docx");
        assert!(files.read("A.docx").await.is_err());
    }
}
