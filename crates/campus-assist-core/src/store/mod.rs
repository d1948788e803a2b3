//! Storage abstraction for the retrieval pipeline.
//!
//! Two read-only collaborators back the core:
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`CorpusStore`] | The knowledge base of `{filename, content}` entries |
//! | [`FileStore`] | The directory of deliverable original files |
//!
//! Implementations must not cache: every call observes the current state of
//! the backing storage, so an ingestion run is visible on the next query
//! without any invalidation step. Both are `Send + Sync` and safe to share
//! between concurrent requests.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Document;

/// Read access to the ingested corpus.
#[async_trait]
pub trait CorpusStore: Send + Sync {
    /// Load the full corpus. An absent knowledge base is an empty corpus,
    /// not an error.
    async fn load(&self) -> Result<Vec<Document>>;
}

/// Listing and byte reads over the document root.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Names of the regular files directly under the root, in a stable order.
    async fn list(&self) -> Result<Vec<String>>;

    /// Read a file named exactly as returned by [`list`](FileStore::list).
    async fn read(&self, name: &str) -> Result<Vec<u8>>;
}
