//! HR Agent - dialogue controller over the record store
//!
//! `HrAgent::process` is the single entry point: one utterance plus the
//! caller-held [`ConversationState`] in, one [`ResponseEnvelope`] out.
//!
//! ## Turn handling
//!
//! ```text
//! state inactive ──► classify intent + extract table ──► SELECT  ─┐
//!   (FRESH)                                          ├─► INSERT ──┼─► slot filling (COLLECTING)
//!                                                    ├─► UPDATE ──┤
//!                                                    └─► DELETE ──┘
//!
//! state active ────► INSERT: text is the value for `last_asked_field`
//!   (COLLECTING)     UPDATE: text is re-parsed as an UPDATE on the same table
//! ```
//!
//! Every completed or failed operation returns the empty state, so the next
//! utterance starts fresh. Values that do not fit their column are the one
//! recoverable failure: the state comes back unchanged and the caller is asked
//! again.
//!
//! The agent keeps no per-conversation memory and is safe to share across
//! concurrent requests.

mod dialogue;
mod operations;

use std::sync::Arc;

use hr_nlu::{DisplayNames, Lexicon, SchemaCatalog};
use hr_types::{ConversationState, ResponseEnvelope, TableSchema};
use tracing::{debug, warn};

use crate::config::DEFAULT_RESULT_LIMIT;
use crate::error::AgentError;
use crate::store::RecordStore;

pub struct HrAgent {
    lexicon: Arc<Lexicon>,
    store: Arc<dyn RecordStore>,
    result_limit: usize,
}

impl HrAgent {
    pub fn new(lexicon: Arc<Lexicon>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            lexicon,
            store,
            result_limit: DEFAULT_RESULT_LIMIT,
        }
    }

    /// Row cap for SELECT
    pub fn with_result_limit(mut self, limit: usize) -> Self {
        self.result_limit = limit.max(1);
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Answer one utterance.
    ///
    /// Never fails: every error is folded into an `error` or `dialog_needed`
    /// envelope carrying the diagnostic text.
    pub async fn process(&self, text: &str, state: ConversationState) -> ResponseEnvelope {
        let text = text.trim();
        debug!(text, active = state.is_active(), "processing utterance");

        let result = if state.is_active() {
            self.continue_turn(text, state).await
        } else {
            self.fresh_turn(text).await
        };

        result.unwrap_or_else(|err| {
            warn!(error = %err, "request failed");
            err.into_envelope()
        })
    }

    fn schema(&self, table: &str) -> Result<&TableSchema, AgentError> {
        self.lexicon.schema_for(table).ok_or_else(|| {
            AgentError::SchemaMismatch(format!(
                "No tengo un esquema definido para la tabla '{table}'."
            ))
        })
    }

    fn display_name(&self, ident: &str) -> String {
        self.lexicon.display_name(ident)
    }
}
