//! Intent and target-table classification.
//!
//! Keyword membership over folded text. The first entry (in vocabulary
//! order) with any keyword present wins, so classification is deterministic.

use hr_types::Intent;

use crate::lexicon::Lexicon;
use crate::text::fold;

/// Operation the request asks for; `Intent::Unknown` when no keyword is present
pub fn classify_intent(lexicon: &Lexicon, text: &str) -> Intent {
    let folded = fold(text);
    let intent = lexicon
        .intent_keywords()
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| folded.contains(k.as_str())))
        .map(|(intent, _)| *intent)
        .unwrap_or_default();
    tracing::debug!(%intent, "classified request");
    intent
}

/// Table the request is about
pub fn extract_table<'l>(lexicon: &'l Lexicon, text: &str) -> Option<&'l str> {
    let folded = fold(text);
    let table = lexicon
        .table_keywords()
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| folded.contains(k.as_str())))
        .map(|(table, _)| table.as_str());
    tracing::debug!(table = table.unwrap_or("-"), "extracted table");
    table
}
