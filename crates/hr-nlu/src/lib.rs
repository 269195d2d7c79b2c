//! Rule-based understanding of Spanish HR requests
//!
//! Turns free text into an intent, a target table, at most one condition and
//! seed values for new records. It has no database dependencies - execution
//! and dialogue state stay in `hr-agent`.
//!
//! ## Pipeline
//!
//! ```text
//! text → fold → classify_intent / extract_table
//!             → extract_condition (filter | assignment | where)
//!             → extract_update_params (SET + WHERE)
//!             → extract_seed_data (INSERT)
//! ```
//!
//! Every matcher is driven by the [`Lexicon`], loaded from YAML. Declaration
//! order in the YAML is match priority; the first match always wins.

pub mod classifier;
pub mod coerce;
pub mod conditions;
pub mod error;
pub mod extractor;
pub mod lexicon;
pub mod text;

pub use classifier::{classify_intent, extract_table};
pub use coerce::{coerce_key, coerce_numeric, coerce_to_kind, MAX_INTEGER};
pub use conditions::{extract_condition, extract_update_params, ExtractionMode};
pub use error::{CoercionError, LexiconError};
pub use extractor::extract_seed_data;
pub use lexicon::{DisplayNames, Lexicon, LexiconConfig, SchemaCatalog};
