//! Seed data for a new record, pulled from the opening INSERT utterance.

use std::collections::BTreeMap;

use hr_types::{FieldValue, TableSchema};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::lexicon::Lexicon;
use crate::text::FoldedText;

/// `... a Ana Ruiz` / `... en Ana Ruiz`
static PERSON_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:a|en)\s+(\S+)\s+(\S+)").unwrap());

/// Values for schema fields found in `text`.
///
/// Two shapes are recognized: a person name after `a`/`en` (tables with both
/// `first_name` and `last_name`) and labelled pairs such as `correo: ana@hr.com`.
/// Labelled pairs win over the name heuristic. Values are returned as text;
/// column-kind validation is the caller's job.
pub fn extract_seed_data(
    lexicon: &Lexicon,
    text: &str,
    schema: &TableSchema,
) -> BTreeMap<String, FieldValue> {
    let folded = FoldedText::new(text);
    let mut data = BTreeMap::new();

    if schema.has_field("first_name") && schema.has_field("last_name") {
        if let Some((first, last)) = person_name(&folded) {
            data.insert("first_name".to_string(), FieldValue::Text(first));
            data.insert("last_name".to_string(), FieldValue::Text(last));
        }
    }

    for caps in lexicon.patterns().labelled_pair.captures_iter(folded.as_str()) {
        let (Some(phrase), Some(value)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        let Some(column) = lexicon.column_for(phrase.as_str(), Some(schema.name.as_str())) else {
            continue;
        };
        if !schema.has_field(column) {
            tracing::debug!(column, table = %schema.name, "labelled field not in table");
            continue;
        }
        let raw = folded.original_slice(value.start(), value.end());
        let raw = raw.trim_matches(['\'', '"']).trim();
        if !raw.is_empty() {
            data.insert(column.to_string(), FieldValue::text(raw));
        }
    }

    tracing::debug!(table = %schema.name, fields = ?data.keys().collect::<Vec<_>>(), "seeded data");
    data
}

fn person_name(folded: &FoldedText<'_>) -> Option<(String, String)> {
    let caps = PERSON_NAME.captures(folded.as_str())?;
    let first = caps.get(1)?;
    let last = caps.get(2)?;
    let first = folded.original_slice(first.start(), first.end());
    let last = folded.original_slice(last.start(), last.end());
    if !starts_alphabetic(first) || !starts_alphabetic(last) {
        return None;
    }
    Some((capitalize(first), capitalize(last)))
}

fn starts_alphabetic(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_alphabetic)
}

/// First letter upper-cased, the rest lower-cased
fn capitalize(word: &str) -> String {
    let word = word.trim_end_matches(['.', ',', ';']);
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
