//! Extraction regexes compiled from the vocabulary.
//!
//! All patterns run against folded text (see [`crate::text`]).

use hr_types::ConditionOp;
use regex::Regex;

use super::loader::{FieldPhrase, OperatorPhrase};
use crate::error::LexiconError;
use crate::text::fold;

/// Single token value for filters: words, numbers, emails, amounts
const FILTER_VALUE: &str = r"[\w.,@$\-]+";

/// WHERE values: quoted text or a single token
const WHERE_VALUE: &str = r#"'[^']*'|"[^"]*"|[\w.@$\-]+"#;

/// One filter-mode pattern per operator phrase
#[derive(Debug, Clone)]
pub(crate) struct FilterPattern {
    pub phrase: String,
    pub op: ConditionOp,
    pub regex: Regex,
}

#[derive(Debug, Clone)]
pub(crate) struct Patterns {
    /// In operator declaration order
    pub filters: Vec<FilterPattern>,
    /// `FIELD [filler] (a|por|con|es|=) VALUE...`
    pub set_clause: Regex,
    /// `donde [article] FIELD connector VALUE`
    pub where_donde: Regex,
    /// `con [article] FIELD connector VALUE`
    pub where_con: Regex,
    /// `(donde|con) [article] FIELD [connector] VALUE`, DELETE only
    pub key_clause: Regex,
    /// `FIELD: VALUE` / `FIELD = VALUE`
    pub labelled_pair: Regex,
}

impl Patterns {
    pub fn compile(
        fields: &[FieldPhrase],
        operators: &[OperatorPhrase],
    ) -> Result<Self, LexiconError> {
        let fields = field_alternation(fields);

        let filters = operators
            .iter()
            .map(|op| {
                let phrase = fold(&op.phrase);
                let regex = Regex::new(&format!(
                    r"\b({fields})\b.*?\b{}\b.*?\s+({FILTER_VALUE})",
                    phrase_pattern(&phrase)
                ))?;
                Ok(FilterPattern {
                    phrase,
                    op: op.op,
                    regex,
                })
            })
            .collect::<Result<Vec<_>, LexiconError>>()?;

        let set_clause = Regex::new(&format!(
            r"\b({fields})\b(?:\s+\w+){{0,3}}?(?:\s+(?:a|por|con|es)\s+|\s*=\s*)(.+)"
        ))?;

        let where_donde = Regex::new(&lead_in_clause("donde", &fields, ""))?;
        let where_con = Regex::new(&lead_in_clause("con", &fields, ""))?;
        let key_clause = Regex::new(&lead_in_clause("(?:donde|con)", &fields, "?"))?;

        let labelled_pair = Regex::new(&format!(
            r#"\b({fields})\b\s*[:=]\s*('[^']*'|"[^"]*"|[^\s,;]+)"#
        ))?;

        Ok(Self {
            filters,
            set_clause,
            where_donde,
            where_con,
            key_clause,
            labelled_pair,
        })
    }
}

/// `LEAD [article] FIELD CONNECTOR VALUE`; `connector_quantifier` is `?` to make the connector optional
fn lead_in_clause(lead: &str, fields: &str, connector_quantifier: &str) -> String {
    format!(
        r"\b{lead}\s+(?:(?:el|la|los|las|su)\s+)?({fields})\b\s*(?:(?:es\s+igual\s+a|igual\s+a|es|sea|a)\s+|=\s*){connector_quantifier}({WHERE_VALUE})"
    )
}

/// Alternation of every field phrase, longest first; equal lengths keep declaration order
fn field_alternation(fields: &[FieldPhrase]) -> String {
    let mut phrases: Vec<String> = Vec::with_capacity(fields.len());
    for field in fields {
        let folded = fold(&field.phrase);
        if !phrases.contains(&folded) {
            phrases.push(folded);
        }
    }
    phrases.sort_by_key(|p| std::cmp::Reverse(p.len()));
    phrases
        .iter()
        .map(|p| phrase_pattern(p))
        .collect::<Vec<_>>()
        .join("|")
}

/// Escaped phrase with flexible inner whitespace
fn phrase_pattern(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}
