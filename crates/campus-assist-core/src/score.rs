//! Lexical relevance scorer.
//!
//! A cheap, deterministic term-overlap ranker over the whole corpus. No
//! embeddings, no external calls.
//!
//! # Algorithm
//!
//! 1. Lower-case the query and split it on whitespace; keep terms longer
//!    than [`MIN_TERM_CHARS`] characters.
//! 2. For every document and every term:
//!    - `+20` if the term occurs in the lower-cased filename,
//!    - `+1` if it occurs in the lower-cased content,
//!    - `+5` when the term is one of the [`BONUS_TERMS`] and also occurs in
//!      the content.
//! 3. Drop documents scoring 0.
//! 4. Stable sort by score, descending (ties keep corpus order).
//! 5. Keep the top [`MAX_RESULTS`].

use crate::models::{Document, ScoredDocument};

/// Terms must be strictly longer than this many characters.
pub const MIN_TERM_CHARS: usize = 2;
/// Maximum number of documents returned by [`rank`].
pub const MAX_RESULTS: usize = 3;

const FILENAME_HIT: u32 = 20;
const CONTENT_HIT: u32 = 1;
const BONUS_HIT: u32 = 5;

/// Domain terms ("internship", "date") that earn an extra bonus when the
/// content mentions them.
pub const BONUS_TERMS: [&str; 2] = ["staj", "tarih"];

/// Split a query into scoring terms.
pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() > MIN_TERM_CHARS)
        .map(str::to_string)
        .collect()
}

/// Score one document against pre-tokenized terms.
pub fn score_document(doc: &Document, terms: &[String]) -> u32 {
    let filename = doc.filename.to_lowercase();
    let content = doc.content.to_lowercase();

    terms.iter().fold(0, |mut score, term| {
        if filename.contains(term.as_str()) {
            score += FILENAME_HIT;
        }
        if content.contains(term.as_str()) {
            score += CONTENT_HIT;
        }
        if BONUS_TERMS.contains(&term.as_str()) && content.contains(term.as_str()) {
            score += BONUS_HIT;
        }
        score
    })
}

/// Rank the corpus against a query.
///
/// Returns at most [`MAX_RESULTS`] documents, all with a positive score,
/// in non-increasing score order. An empty query or corpus yields an empty
/// result.
pub fn rank(corpus: &[Document], query: &str) -> Vec<ScoredDocument> {
    let terms = tokenize(query);
    if terms.is_empty() || corpus.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<ScoredDocument> = corpus
        .iter()
        .filter_map(|doc| {
            let score = score_document(doc, &terms);
            (score > 0).then(|| ScoredDocument::new(doc.clone(), score))
        })
        .collect();

    // `sort_by` is stable, so equal scores keep their corpus order.
    scored.sort_by(|a, b| b.score.cmp(&a.score));
    scored.truncate(MAX_RESULTS);
    scored
}
