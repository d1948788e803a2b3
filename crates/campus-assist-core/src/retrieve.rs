//! Query → selected documents.
//!
//! The corpus is loaded fresh from the [`CorpusStore`] on every call, then
//! the override table gets the first look; only when no rule fires does
//! the plain scorer run.

use anyhow::Result;
use tracing::debug;

use crate::models::{Document, ScoredDocument};
use crate::overrides;
use crate::score;
use crate::store::CorpusStore;

/// Select documents for a query over an already-loaded corpus.
pub fn select_documents(corpus: &[Document], query: &str) -> Vec<ScoredDocument> {
    match overrides::try_inject(corpus, query) {
        Some(injection) => injection.documents,
        None => score::rank(corpus, query),
    }
}

/// Load the corpus and select documents for `query`.
pub async fn retrieve<S: CorpusStore + ?Sized>(
    store: &S,
    query: &str,
) -> Result<Vec<ScoredDocument>> {
    let corpus = store.load().await?;
    let selected = select_documents(&corpus, query);
    debug!(
        corpus = corpus.len(),
        selected = selected.len(),
        "Retrieved documents"
    );
    Ok(selected)
}
