//! Condition extraction: filter triples for SELECT/DELETE, SET and WHERE
//! clauses for UPDATE.
//!
//! Only the first match is ever used. A field phrase the vocabulary cannot
//! map to a column ends the attempt with `None`; nothing here returns an
//! error or panics on malformed input.

use hr_types::{Condition, ConditionOp, FieldValue, UpdateParams};
use regex::{Captures, Regex};

use crate::coerce::{coerce_key, coerce_numeric};
use crate::lexicon::Lexicon;
use crate::text::FoldedText;

/// Which clause shape to look for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// `FIELD ... OPERATOR ... VALUE`, operators in declaration order
    Filter,
    /// `FIELD [filler] (a|por|con|es|=) VALUE`
    Assignment,
    /// `(donde|con) [article] FIELD [connector] VALUE`, the DELETE key clause
    Where,
}

/// Extract at most one condition from `text`
pub fn extract_condition(
    lexicon: &Lexicon,
    text: &str,
    table: Option<&str>,
    mode: ExtractionMode,
) -> Option<Condition> {
    let folded = FoldedText::new(text);
    let condition = match mode {
        ExtractionMode::Filter => filter_condition(lexicon, &folded, table),
        ExtractionMode::Assignment => set_condition(lexicon, &folded, table, 0, folded.as_str().len()),
        ExtractionMode::Where => {
            where_condition(lexicon, &lexicon.patterns().key_clause, &folded, table)
                .map(|(c, _, _)| c)
        }
    };
    match &condition {
        Some(c) => tracing::debug!(?mode, field = %c.field, op = %c.op, value = %c.value, "extracted condition"),
        None => tracing::debug!(?mode, "no condition found"),
    }
    condition
}

/// SET and WHERE clauses of a single-sentence UPDATE.
///
/// The WHERE clause is located first, a `donde` clause taking precedence over
/// a `con` one; the SET clause is searched in the text before it, then after
/// it, so the SET value never swallows the WHERE span.
pub fn extract_update_params(
    lexicon: &Lexicon,
    text: &str,
    table: Option<&str>,
) -> Option<UpdateParams> {
    let folded = FoldedText::new(text);
    let patterns = lexicon.patterns();
    let located = where_condition(lexicon, &patterns.where_donde, &folded, table)
        .or_else(|| where_condition(lexicon, &patterns.where_con, &folded, table));
    let Some((filter, where_start, where_end)) = located else {
        tracing::debug!("update without WHERE clause");
        return None;
    };

    let set = set_condition(lexicon, &folded, table, 0, where_start).or_else(|| {
        set_condition(lexicon, &folded, table, where_end, folded.as_str().len())
    });
    let Some(set) = set else {
        tracing::debug!(where_field = %filter.field, "update without SET clause");
        return None;
    };

    tracing::debug!(
        set_field = %set.field,
        set_value = %set.value,
        where_field = %filter.field,
        where_value = %filter.value,
        "extracted update params"
    );
    Some(UpdateParams { set, filter })
}

// ============================================================================
// CLAUSE MATCHERS
// ============================================================================

fn filter_condition(
    lexicon: &Lexicon,
    folded: &FoldedText<'_>,
    table: Option<&str>,
) -> Option<Condition> {
    let (pattern, caps) = lexicon
        .patterns()
        .filters
        .iter()
        .find_map(|p| p.regex.captures(folded.as_str()).map(|caps| (p, caps)))?;

    let field = column(lexicon, &caps, table)?;
    let raw = captured_original(folded, &caps, 2, 0)?;
    tracing::trace!(phrase = %pattern.phrase, "filter operator matched");
    Some(Condition::new(field, pattern.op, coerce_numeric(clean_value(raw))))
}

fn set_condition(
    lexicon: &Lexicon,
    folded: &FoldedText<'_>,
    table: Option<&str>,
    start: usize,
    end: usize,
) -> Option<Condition> {
    let segment = folded.as_str().get(start..end)?;
    let caps = lexicon.patterns().set_clause.captures(segment)?;

    let field = column(lexicon, &caps, table)?;
    let raw = clean_value(captured_original(folded, &caps, 2, start)?);
    if raw.is_empty() {
        return None;
    }
    Some(Condition::new(field, ConditionOp::Assign, coerce_numeric(raw)))
}

/// WHERE condition plus the folded byte span it covers
fn where_condition(
    lexicon: &Lexicon,
    pattern: &Regex,
    folded: &FoldedText<'_>,
    table: Option<&str>,
) -> Option<(Condition, usize, usize)> {
    let caps = pattern.captures(folded.as_str())?;
    let span = caps.get(0)?;

    let field = column(lexicon, &caps, table)?;
    let raw = clean_value(captured_original(folded, &caps, 2, 0)?);
    if raw.is_empty() {
        return None;
    }
    let value = coerce_key(&FieldValue::text(raw));
    Some((
        Condition::new(field, ConditionOp::Eq, value),
        span.start(),
        span.end(),
    ))
}

// ============================================================================
// HELPERS
// ============================================================================

/// Column for the field phrase in group 1, `None` when unmapped
fn column(lexicon: &Lexicon, caps: &Captures<'_>, table: Option<&str>) -> Option<String> {
    let phrase = caps.get(1)?.as_str();
    match lexicon.column_for(phrase, table) {
        Some(column) => Some(column.to_string()),
        None => {
            tracing::debug!(phrase, "field phrase has no column mapping");
            None
        }
    }
}

/// Original-text slice of a capture group; `offset` locates a segment match
fn captured_original<'a>(
    folded: &FoldedText<'a>,
    caps: &Captures<'_>,
    group: usize,
    offset: usize,
) -> Option<&'a str> {
    let m = caps.get(group)?;
    Some(folded.original_slice(offset + m.start(), offset + m.end()))
}

/// Trim, unquote and drop trailing sentence punctuation
fn clean_value(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['\'', '"'] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    trimmed
        .trim_end_matches(['.', ',', ';', '!', '?'])
        .trim_end()
}
