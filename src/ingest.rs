//! Corpus ingestion.
//!
//! Walks `[ingest].root`, extracts plain text from every matching DOCX,
//! XLSX and PDF file, caps it at `[corpus].max_content_chars`, and upserts
//! the result into the knowledge base by exact filename. Files that fail to
//! extract are skipped with a warning; one bad file never aborts a run.

use anyhow::{Context, Result};
use campus_assist_core::delivery::mime_for;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{Config, IngestConfig};
use crate::corpus::{CorpusEntry, JsonCorpus};
use crate::extract::extract_text;
use crate::storage::is_ignored_name;

/// A file selected for ingestion.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the ingest root.
    pub relative: String,
    /// Bare file name; becomes the corpus identity.
    pub filename: String,
}

pub async fn run_ingest(config: &Config, dry_run: bool) -> Result<()> {
    let ingest = config
        .ingest
        .as_ref()
        .context("Ingestion not configured: add an [ingest] section")?;

    let files = scan_documents(ingest)?;

    if dry_run {
        println!("ingest (dry-run)");
        println!("  files found: {}", files.len());
        for file in &files {
            println!("  {}", file.relative);
        }
        return Ok(());
    }

    let max_chars = config.corpus.max_content_chars;
    let mut entries = Vec::new();
    let mut skipped = 0usize;

    for file in &files {
        match extract_entry(file, max_chars) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {
                skipped += 1;
                warn!(file = %file.relative, "No text extracted, skipping");
            }
            Err(e) => {
                skipped += 1;
                warn!(file = %file.relative, error = %e, "Extraction failed, skipping");
            }
        }
    }

    let corpus = JsonCorpus::new(&config.corpus.path);
    let stats = corpus.upsert(entries).await?;
    info!(
        added = stats.added,
        updated = stats.updated,
        skipped,
        "Ingestion complete"
    );

    println!("ingest");
    println!("  files found: {}", files.len());
    println!("  added: {}", stats.added);
    println!("  updated: {}", stats.updated);
    println!("  skipped: {}", skipped);
    println!("  corpus: {}", corpus.path().display());
    println!("ok");
    Ok(())
}

/// Upsert a single entry whose text is read from `content_path`.
pub async fn run_append(config: &Config, filename: &str, content_path: &Path) -> Result<()> {
    if filename.trim().is_empty() {
        anyhow::bail!("filename must not be empty");
    }
    let content = std::fs::read_to_string(content_path)
        .with_context(|| format!("Failed to read content file: {}", content_path.display()))?;

    let corpus = JsonCorpus::new(&config.corpus.path);
    let stats = corpus
        .upsert(vec![CorpusEntry::new(filename, content)])
        .await?;

    if stats.updated > 0 {
        println!("Updated existing entry: {}", filename);
    } else {
        println!("Added new entry: {}", filename);
    }
    Ok(())
}

/// List ingestible files under the configured root, sorted by relative path.
pub fn scan_documents(ingest: &IngestConfig) -> Result<Vec<ScannedFile>> {
    let root = &ingest.root;
    if !root.exists() {
        anyhow::bail!("Ingest root does not exist: {}", root.display());
    }

    let include_set = build_globset(&ingest.include_globs)?;
    let exclude_set = build_globset(&ingest.exclude_globs)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(ingest.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let filename = entry.file_name().to_string_lossy().to_string();
        if is_ignored_name(&filename) {
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        files.push(ScannedFile {
            path: path.to_path_buf(),
            relative: rel_str,
            filename,
        });
    }

    // Sort for deterministic ordering
    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    Ok(files)
}

/// Extract one file into a corpus entry. `Ok(None)` means the file yielded
/// no text.
pub fn extract_entry(file: &ScannedFile, max_chars: usize) -> Result<Option<CorpusEntry>> {
    let bytes =
        std::fs::read(&file.path).with_context(|| format!("Failed to read {}", file.relative))?;
    let text = extract_text(&bytes, mime_for(&file.filename))?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }

    let kind = campus_assist_core::resolve::extension(&file.filename).unwrap_or_default();
    Ok(Some(
        CorpusEntry::new(&file.filename, truncate_chars(text, max_chars))
            .with_extra("path", file.relative.clone())
            .with_extra("type", kind),
    ))
}

/// The first `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingest_config(root: &Path) -> IngestConfig {
        IngestConfig {
            root: root.to_path_buf(),
            include_globs: vec![
                "**/*.docx".to_string(),
                "**/*.xlsx".to_string(),
                "**/*.pdf".to_string(),
            ],
            exclude_globs: vec!["arsiv/**".to_string()],
            follow_symlinks: false,
        }
    }

    #[test]
    fn scan_applies_globs_and_skips_lock_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::write(root.join("Staj Formu.pdf"), b"x").unwrap();
        std::fs::write(root.join("~$Staj Formu.docx"), b"x").unwrap();
        std::fs::write(root.join(".gizli.docx"), b"x").unwrap();
        std::fs::write(root.join("notlar.txt"), b"x").unwrap();
        std::fs::create_dir(root.join("arsiv")).unwrap();
        std::fs::write(root.join("arsiv").join("eski.docx"), b"x").unwrap();
        std::fs::create_dir(root.join("formlar")).unwrap();
        std::fs::write(root.join("formlar").join("FR-004.docx"), b"x").unwrap();

        let files = scan_documents(&ingest_config(root)).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(names, vec!["Staj Formu.pdf", "FR-004.docx"]);
    }

    #[test]
    fn scan_missing_root_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan_documents(&ingest_config(&dir.path().join("yok"))).is_err());
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("çğüşöı", 3), "çğü");
        assert_eq!(truncate_chars("kısa", 10), "kısa");
    }
}
