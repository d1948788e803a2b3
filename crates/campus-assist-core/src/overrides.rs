//! Override rules that force compliance-critical documents into context.
//!
//! Some official forms must always reach the model when a query mentions
//! them, even if their extracted text barely overlaps the query. Each
//! [`OverrideRule`] pairs a set of trigger markers with the filenames it
//! forces in and a [`Blend`] policy describing what else joins them.
//!
//! Rules live in the ordered [`RULES`] table and are evaluated top to
//! bottom; the first rule whose marker occurs in the lower-cased query wins
//! and later rules are not consulted.

use tracing::debug;

use crate::models::{Document, ScoredDocument};
use crate::score;

/// What accompanies the forced documents once a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blend {
    /// Add the first corpus entry that is not one of the forced filenames.
    /// The scorer does not run.
    FirstUnforced,
    /// Append the scorer's top results over the full corpus, without
    /// de-duplicating against the forced set.
    Scorer,
}

/// A static trigger → forced-documents rule.
#[derive(Debug)]
pub struct OverrideRule {
    pub name: &'static str,
    /// Lower-case substrings; any one of them triggers the rule.
    pub markers: &'static [&'static str],
    /// Filenames injected, in this order, with the forced score.
    pub forced: &'static [&'static str],
    /// Placeholder content given to every forced document.
    pub injected_content: &'static str,
    pub blend: Blend,
}

impl OverrideRule {
    pub fn triggers(&self, query_lower: &str) -> bool {
        self.markers.iter().any(|m| query_lower.contains(*m))
    }

    pub fn blends_with_scorer(&self) -> bool {
        self.blend == Blend::Scorer
    }

    fn forced_documents(&self) -> Vec<ScoredDocument> {
        self.forced
            .iter()
            .map(|filename| ScoredDocument::forced(filename, self.injected_content))
            .collect()
    }
}

/// Weekly course-schedule forms, one per department / section.
pub const SCHEDULE_FILES: &[&str] = &[
    "FR-011 Haftalık Ders Programı Formu - Bilgisayar Teknolojileri Bölümü.pdf",
    "FR-011 Haftalık Ders Programı Formu Bitkisel ve Hayvansal Üretim.pdf",
    "FR-011 Haftalık Ders Programı Formu Büro Hizmetleri ve Sekreterlik.pdf",
    "FR-011 Haftalık Ders Programı Formu Çocuk Bakımı ve Gençlik Hizmetleri.pdf",
    "FR-011 Haftalık Ders Programı Formu Veterinerlik Bölümü 1. ŞUBE.pdf",
    "FR-011 Haftalık Ders Programı Formu Veterinerlik Bölümü 2. ŞUBE.pdf",
    "FR-011 Haftalık Ders Programı Formu Veterinerlik Bölümü ESKİ MÜFREDAT.pdf",
];

/// Department-specific internship application forms.
///
/// The "Formui" spelling matches the file as it is stored.
pub const INTERNSHIP_FILES: &[&str] = &[
    "Bilgisayar Teknolojileri Bölümü Staj Başvuru ve Kabul Formu.pdf",
    "Bitkisel ve Hayvansal Üretim Bölümü Staj Başvuru ve Kabul Formu.pdf",
    "Büro Hizmetleri ve Sekreterlik Bölümü Staj Başvuru ve Kabul Formui.pdf",
    "Çocuk Bakımı ve Gençlik Hizmetleri Bölümü Staj Başvuru ve Kabul Formu.pdf",
    "Veterinerlik Bölümü Staj Başvuru ve Kabul Formu.pdf",
];

pub const SCHEDULE_RULE: OverrideRule = OverrideRule {
    name: "course-schedule",
    markers: &["ders programı", "haftalık ders"],
    forced: SCHEDULE_FILES,
    injected_content: "BU BELGE SİSTEMDE MEVCUTTUR. Haftalık Ders Programı. \
        Kullanıcı bu belgeyi isterse 'generate_file' action'ı ile sunabilirsin.",
    blend: Blend::FirstUnforced,
};

pub const INTERNSHIP_RULE: OverrideRule = OverrideRule {
    name: "internship-forms",
    markers: &["staj", "form", "belge"],
    forced: INTERNSHIP_FILES,
    injected_content: "BU BELGE SİSTEMDE MEVCUTTUR. Staj Başvuru ve Kabul Formu. \
        Kullanıcı bu belgeyi isterse 'generate_file' action'ı ile sunabilirsin.",
    blend: Blend::Scorer,
};

/// Rules in priority order.
pub const RULES: &[OverrideRule] = &[SCHEDULE_RULE, INTERNSHIP_RULE];

/// The outcome of a fired rule.
#[derive(Debug)]
pub struct Injection {
    pub rule: &'static OverrideRule,
    /// Forced documents followed by whatever the rule's [`Blend`] adds.
    pub documents: Vec<ScoredDocument>,
}

/// Find the first rule in `rules` triggered by `query`.
pub fn find_rule(rules: &'static [OverrideRule], query: &str) -> Option<&'static OverrideRule> {
    let query_lower = query.to_lowercase();
    rules.iter().find(|rule| rule.triggers(&query_lower))
}

/// Apply the override table to a query.
///
/// Returns `None` when no rule triggers; the caller then falls back to the
/// plain scorer.
pub fn try_inject(corpus: &[Document], query: &str) -> Option<Injection> {
    try_inject_with(RULES, corpus, query)
}

/// [`try_inject`] over an explicit rule table.
pub fn try_inject_with(
    rules: &'static [OverrideRule],
    corpus: &[Document],
    query: &str,
) -> Option<Injection> {
    let rule = find_rule(rules, query)?;
    let mut documents = rule.forced_documents();

    match rule.blend {
        Blend::FirstUnforced => {
            let terms = score::tokenize(query);
            if let Some(doc) = corpus
                .iter()
                .find(|d| !rule.forced.contains(&d.filename.as_str()))
            {
                let lexical = score::score_document(doc, &terms);
                documents.push(ScoredDocument::new(doc.clone(), lexical));
            }
        }
        Blend::Scorer => documents.extend(score::rank(corpus, query)),
    }

    debug!(
        rule = rule.name,
        forced = rule.forced.len(),
        total = documents.len(),
        "Override rule fired"
    );

    Some(Injection { rule, documents })
}
