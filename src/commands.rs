//! CLI command implementations that print to stdout.

use anyhow::{bail, Context, Result};
use campus_assist_core::action::FileRequest;
use campus_assist_core::context;
use campus_assist_core::resolve;
use campus_assist_core::retrieve;
use std::path::Path;

use crate::assistant::Assistant;
use crate::chat::ChatInput;
use crate::config::Config;
use crate::corpus::JsonCorpus;
use crate::deliver;
use crate::storage::DirectoryStore;

pub async fn run_search(config: &Config, query: &str, show_context: bool) -> Result<()> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let corpus = JsonCorpus::new(&config.corpus.path);
    let selected = retrieve::retrieve(&corpus, query).await?;

    if selected.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, doc) in selected.iter().enumerate() {
        println!("{}. [{}] {}", i + 1, doc.score, doc.filename());
    }

    if show_context {
        println!();
        println!("{}", context::assemble(&selected));
    }
    Ok(())
}

pub async fn run_resolve(config: &Config, filename: &str) -> Result<()> {
    let files = DirectoryStore::new(&config.storage.root);
    let names = deliver::listing(&files).await;

    match resolve::resolve(filename, &names) {
        Some(resolution) => {
            println!("{}", resolution.name);
            println!("  stage: {}", resolution.stage);
        }
        None => println!("not found: {}", filename),
    }
    Ok(())
}

/// Parse `key=value` pairs given with `--data`.
pub fn parse_data_pairs(pairs: &[String]) -> Result<FileRequest> {
    let mut request = FileRequest::default();
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("invalid --data '{}': expected key=value", pair))?;
        request = request.with_field(key.trim(), value.trim());
    }
    Ok(request)
}

pub async fn run_fetch(
    config: &Config,
    filename: &str,
    data: &[String],
    out_dir: &Path,
) -> Result<()> {
    let mut request = parse_data_pairs(data)?;
    request.filename = filename.to_string();

    let assistant = Assistant::from_config(config).await?;
    let delivered = assistant
        .fetch(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.public_message()))?;

    let target = delivered
        .save_to(out_dir)
        .with_context(|| format!("Failed to write into {}", out_dir.display()))?;

    println!("{}", target.display());
    println!("  delivery: {:?}", delivered.kind);
    if let Some(stage) = delivered.stage {
        println!("  stage: {}", stage);
    }
    println!("  content-type: {}", delivered.mime);
    println!("  bytes: {}", delivered.bytes.len());
    Ok(())
}

pub async fn run_ask(config: &Config, message: &str) -> Result<()> {
    let assistant = Assistant::from_config(config).await?;
    let outcome = assistant
        .chat_to_completion(ChatInput::new(message))
        .await
        .map_err(|e| anyhow::anyhow!(e.public_message()))?;

    println!("{}", outcome.reply);
    if let Some(file) = outcome.file {
        println!();
        println!("file: {}", file.filename);
        println!("  delivery: {:?}", file.delivery);
        if let Some(resolved) = file.resolved {
            println!("  resolved: {}", resolved);
        }
    }
    Ok(())
}
