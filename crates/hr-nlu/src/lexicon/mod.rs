//! Vocabulary: intent and table keywords, operator and field phrases,
//! display names and table schemas.
//!
//! The built-in vocabulary is embedded from `config/lexicon.yaml`. A
//! deployment can ship its own file and load it with [`Lexicon::from_path`].
//! Once built a `Lexicon` is immutable and safe to share across threads.

mod loader;
pub(crate) mod patterns;

use std::collections::HashMap;
use std::path::Path;

use hr_types::{ConditionOp, Intent, TableSchema};
use once_cell::sync::Lazy;

pub use loader::{
    FieldPhrase, IntentKeywords, LexiconConfig, OperatorPhrase, TableKeywords, Translation,
};

use crate::error::LexiconError;
use crate::text::fold;
use patterns::Patterns;

const BUILTIN_YAML: &str = include_str!("../../config/lexicon.yaml");

static BUILTIN: Lazy<Lexicon> = Lazy::new(|| {
    Lexicon::from_yaml_str(BUILTIN_YAML).unwrap_or_else(|e| panic!("embedded lexicon.yaml: {e}"))
});

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Table schema lookup
pub trait SchemaCatalog: Send + Sync {
    fn schema_for(&self, table: &str) -> Option<&TableSchema>;
}

/// Localized display name for a table or column identifier
pub trait DisplayNames: Send + Sync {
    /// Falls back to the identifier itself
    fn display_name(&self, ident: &str) -> String;
}

// ============================================================================
// LEXICON
// ============================================================================

#[derive(Debug, Clone)]
pub struct Lexicon {
    /// Folded keywords, in priority order
    intents: Vec<(Intent, Vec<String>)>,
    /// Folded keywords, in priority order
    tables: Vec<(String, Vec<String>)>,
    /// Phrases folded at load time
    fields: Vec<FieldPhrase>,
    operators: Vec<(String, ConditionOp)>,
    translations: HashMap<String, String>,
    schemas: Vec<TableSchema>,
    patterns: Patterns,
}

impl Lexicon {
    /// Shared built-in vocabulary
    pub fn builtin() -> &'static Lexicon {
        &BUILTIN
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, LexiconError> {
        Self::from_config(LexiconConfig::from_yaml_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LexiconError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let lexicon = Self::from_yaml_str(&yaml)?;
        tracing::info!(path = %path.display(), tables = lexicon.schemas.len(), "loaded lexicon");
        Ok(lexicon)
    }

    pub fn from_config(config: LexiconConfig) -> Result<Self, LexiconError> {
        config.validate()?;
        let patterns = Patterns::compile(&config.fields, &config.operators)?;

        let fold_all =
            |keywords: Vec<String>| -> Vec<String> { keywords.iter().map(|k| fold(k)).collect() };

        let intents = config
            .intents
            .into_iter()
            .map(|e| (e.intent, fold_all(e.keywords)))
            .collect();
        let tables = config
            .tables
            .into_iter()
            .map(|e| (e.table, fold_all(e.keywords)))
            .collect();
        let fields = config
            .fields
            .into_iter()
            .map(|f| FieldPhrase {
                phrase: fold(&f.phrase),
                ..f
            })
            .collect();
        let operators = config
            .operators
            .into_iter()
            .map(|o| (fold(&o.phrase), o.op))
            .collect();
        let translations = config
            .translations
            .into_iter()
            .map(|t| (t.id, t.text))
            .collect();

        Ok(Self {
            intents,
            tables,
            fields,
            operators,
            translations,
            schemas: config.schemas,
            patterns,
        })
    }

    pub(crate) fn intent_keywords(&self) -> &[(Intent, Vec<String>)] {
        &self.intents
    }

    pub(crate) fn table_keywords(&self) -> &[(String, Vec<String>)] {
        &self.tables
    }

    pub(crate) fn patterns(&self) -> &Patterns {
        &self.patterns
    }

    /// Operator for a folded phrase
    pub fn operator_for(&self, phrase: &str) -> Option<ConditionOp> {
        let phrase = fold(phrase);
        self.operators
            .iter()
            .find(|(p, _)| *p == phrase)
            .map(|(_, op)| *op)
    }

    /// Column named by a field phrase, honoring per-table overrides.
    ///
    /// Inner whitespace is normalized so a phrase matched across a line
    /// break still resolves.
    pub fn column_for(&self, phrase: &str, table: Option<&str>) -> Option<&str> {
        let phrase = fold(phrase).split_whitespace().collect::<Vec<_>>().join(" ");
        self.fields
            .iter()
            .find(|f| f.phrase == phrase)
            .map(|f| f.column_for(table))
    }

    pub fn schemas(&self) -> &[TableSchema] {
        &self.schemas
    }

    /// Table names in keyword priority order
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|(t, _)| t.as_str())
    }
}

impl SchemaCatalog for Lexicon {
    fn schema_for(&self, table: &str) -> Option<&TableSchema> {
        self.schemas.iter().find(|s| s.name == table)
    }
}

impl DisplayNames for Lexicon {
    fn display_name(&self, ident: &str) -> String {
        self.translations
            .get(ident)
            .cloned()
            .unwrap_or_else(|| ident.to_string())
    }
}
