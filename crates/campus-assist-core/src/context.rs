//! Prompt-context assembly.
//!
//! Selected documents become delimited blocks of at most
//! [`MAX_EXCERPT_CHARS`] characters each, in the order they were selected.
//! No documents means no context at all: the prompt builder keys off the
//! empty string to omit the grounding section entirely.

use crate::models::ScoredDocument;

/// Characters of content kept per document.
pub const MAX_EXCERPT_CHARS: usize = 2000;
/// Appended to an excerpt that was cut short.
pub const TRUNCATION_MARKER: &str = "... (kısaltıldı)";

const PREAMBLE: &str = "AŞAĞIDAKİ BELGELER BULUNDU. KULLANICI BU BELGELER HAKKINDA SORU SORUYOR \
    VEYA BU BELGELERİ İSTİYOR OLABİLİR.";

/// Format selected documents into a context block.
pub fn assemble(docs: &[ScoredDocument]) -> String {
    if docs.is_empty() {
        return String::new();
    }

    let blocks: Vec<String> = docs.iter().map(format_block).collect();
    format!("{}\n\n{}", PREAMBLE, blocks.join("\n\n"))
}

fn format_block(doc: &ScoredDocument) -> String {
    format!(
        "--- BELGE BAŞLANGICI: {} ---\n{}\n--- BELGE SONU ---",
        doc.filename(),
        excerpt(&doc.doc.content)
    )
}

/// The first [`MAX_EXCERPT_CHARS`] characters of `content`, marked when cut.
pub fn excerpt(content: &str) -> String {
    match content.char_indices().nth(MAX_EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}{}", &content[..cut], TRUNCATION_MARKER),
        None => content.to_string(),
    }
}
