//! Directory-backed [`FileStore`] over the document root.
//!
//! Only regular files directly under the root are listed, skipping office
//! lock files (`~$...`) and dot-files. Reads are restricted to names that
//! appear in the listing, so a request cannot escape the root.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use campus_assist_core::store::FileStore;

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Lock files and hidden files never count as documents.
pub fn is_ignored_name(name: &str) -> bool {
    name.starts_with("~$") || name.starts_with('.')
}

#[async_trait]
impl FileStore for DirectoryStore {
    async fn list(&self) -> Result<Vec<String>> {
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("Failed to list document root: {}", self.root.display()))?;

        let mut names = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            // Non-UTF-8 names cannot be requested by a client anyway.
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_ignored_name(&name) {
                names.push(name);
            }
        }

        // Sort for deterministic ordering
        names.sort();
        Ok(names)
    }

    async fn read(&self, name: &str) -> Result<Vec<u8>> {
        if !self.list().await?.iter().any(|n| n == name) {
            bail!("file not found in document root: {}", name);
        }
        let path = self.root.join(name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))
    }
}
