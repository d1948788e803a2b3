//! Message moderation.
//!
//! A message is rejected when any configured term appears in it as a whole
//! word, ignoring case. Substrings inside longer words do not count, so a
//! short term never blocks an innocent word that happens to contain it.
//!
//! Case folding follows Turkish rules: `I` lowers to `ı` and `İ` to `i`.

#[derive(Debug, Clone, Default)]
pub struct Moderator {
    terms: Vec<String>,
}

impl Moderator {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| turkish_lowercase(t.as_ref().trim()))
            .filter(|t| !t.is_empty())
            .collect();
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The first blocked term found in `message`, if any.
    pub fn check(&self, message: &str) -> Option<&str> {
        if self.terms.is_empty() {
            return None;
        }
        let lowered = turkish_lowercase(message);
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        self.terms
            .iter()
            .find(|term| contains_phrase(&words, term))
            .map(String::as_str)
    }
}

/// Lower-case `text` with the Turkish dotted/dotless `i` mapping.
pub fn turkish_lowercase(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'I' => 'ı',
            'İ' => 'i',
            other => other,
        })
        .collect::<String>()
        .to_lowercase()
}

/// Whether the word sequence of `term` occurs contiguously in `words`.
fn contains_phrase(words: &[&str], term: &str) -> bool {
    let needle: Vec<&str> = term
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    if needle.is_empty() || needle.len() > words.len() {
        return false;
    }
    words.windows(needle.len()).any(|w| w == needle.as_slice())
}
