//! Filename resolution.
//!
//! Models, browsers, and operating systems disagree about how an accented
//! filename is spelled. A requested name is mapped onto the storage listing
//! by a fixed pipeline of pure matchers, stopping at the first hit:
//!
//! | Stage | Matcher |
//! |-------|---------|
//! | [`MatchStage::Exact`] | byte-for-byte equality |
//! | [`MatchStage::Normalized`] | NFC equality, else NFD equality, else case-insensitive NFC equality, per stored name |
//! | [`MatchStage::Fuzzy`] | every significant token of the requested stem is a substring of the stored name |
//!
//! Within a stage, ties go to the earlier entry of the listing. Resolution
//! only ever returns names taken from the listing, so a request can never
//! point outside the document root.

use std::fmt;

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

/// Fuzzy tokens must be strictly longer than this many characters.
pub const MIN_FUZZY_TOKEN_CHARS: usize = 3;

/// Which matcher produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Exact,
    Normalized,
    Fuzzy,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MatchStage::Exact => "exact",
            MatchStage::Normalized => "normalized",
            MatchStage::Fuzzy => "fuzzy",
        };
        f.write_str(label)
    }
}

/// A stored filename chosen for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub name: String,
    pub stage: MatchStage,
}

type Matcher = fn(&str, &[String]) -> Option<usize>;

const PIPELINE: [(MatchStage, Matcher); 3] = [
    (MatchStage::Exact, match_exact),
    (MatchStage::Normalized, match_normalized),
    (MatchStage::Fuzzy, match_fuzzy),
];

/// Resolve `requested` against `listing`.
///
/// Returns `None` when no stage matches; that is the normal outcome for a
/// file that does not exist.
pub fn resolve(requested: &str, listing: &[String]) -> Option<Resolution> {
    PIPELINE.iter().find_map(|(stage, matcher)| {
        matcher(requested, listing).map(|idx| Resolution {
            name: listing[idx].clone(),
            stage: *stage,
        })
    })
}

/// Stage 1: byte-for-byte equality.
pub fn match_exact(requested: &str, listing: &[String]) -> Option<usize> {
    listing.iter().position(|name| name == requested)
}

/// Stage 2: Unicode-equivalent names.
pub fn match_normalized(requested: &str, listing: &[String]) -> Option<usize> {
    let nfc = requested.nfc().collect::<String>();
    let nfd = requested.nfd().collect::<String>();
    let folded = nfc.to_lowercase();

    listing.iter().position(|name| {
        let name_nfc = name.nfc().collect::<String>();
        name_nfc == nfc || name.nfd().eq(nfd.chars()) || name_nfc.to_lowercase() == folded
    })
}

/// Stage 3: AND-of-tokens keyword match.
///
/// A request without any significant token never matches.
pub fn match_fuzzy(requested: &str, listing: &[String]) -> Option<usize> {
    let tokens = fuzzy_tokens(requested);
    if tokens.is_empty() {
        return None;
    }

    listing.iter().position(|name| {
        let haystack = name.nfc().collect::<String>().to_lowercase();
        tokens.iter().all(|t| haystack.contains(t.as_str()))
    })
}

/// Significant tokens of a requested name: extension stripped, NFC,
/// lower-cased, whitespace-split, longer than [`MIN_FUZZY_TOKEN_CHARS`].
pub fn fuzzy_tokens(requested: &str) -> Vec<String> {
    strip_extension(requested)
        .nfc()
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() > MIN_FUZZY_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Remove a trailing `.ext` when it looks like a file extension.
///
/// The suffix after the last dot must be non-empty and alphanumeric, so
/// names such as `"Veterinerlik Bölümü 1. ŞUBE"` keep their text.
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(dot) if dot > 0 && is_extension(&name[dot + 1..]) => &name[..dot],
        _ => name,
    }
}

/// The lower-cased extension of `name`, if it has one.
pub fn extension(name: &str) -> Option<String> {
    let stem = strip_extension(name);
    (stem.len() < name.len()).then(|| name[stem.len() + 1..].to_lowercase())
}

fn is_extension(suffix: &str) -> bool {
    !suffix.is_empty() && suffix.len() <= 8 && suffix.chars().all(|c| c.is_ascii_alphanumeric())
}
