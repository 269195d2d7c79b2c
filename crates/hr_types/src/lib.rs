//! HR Types - Level 1 Foundation Types
//!
//! Pure data structures shared by the vocabulary crate (`hr-nlu`) and the
//! agent crate (`hr-agent`). Nothing here talks to a database or parses text.
//!
//! ## Contents
//!
//! - Operation tags (`Intent`) and comparison operators (`ConditionOp`)
//! - Scalar values as they travel between text, conditions and records (`FieldValue`)
//! - Table descriptors (`TableSchema`, `ColumnSpec`, `ColumnKind`, `KeyPolicy`)
//! - The caller-held dialogue record (`ConversationState`)
//! - The response contract (`ResponseEnvelope`, `ResponseType`)
//!
//! ## Rules
//!
//! 1. **NO BUSINESS LOGIC** - constructors, accessors and formatting only
//! 2. **NO WORKSPACE DEPENDENCIES**
//! 3. **SERIALIZABLE** - everything that crosses the HTTP boundary derives serde

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// INTENT
// ============================================================================

/// Coarse operation class a request maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    Select,
    Insert,
    Update,
    Delete,
    #[default]
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Select => "SELECT",
            Intent::Insert => "INSERT",
            Intent::Update => "UPDATE",
            Intent::Delete => "DELETE",
            Intent::Unknown => "UNKNOWN",
        }
    }

    /// Intents that may span several turns
    pub fn is_multi_turn(&self) -> bool {
        matches!(self, Intent::Insert | Intent::Update)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Intent::Unknown)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized intent or operator tag
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("unknown intent tag '{0}'")]
    Intent(String),

    #[error("unknown operator symbol '{0}'")]
    Operator(String),

    #[error("unknown column kind '{0}'")]
    ColumnKind(String),
}

impl FromStr for Intent {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SELECT" => Ok(Intent::Select),
            "INSERT" => Ok(Intent::Insert),
            "UPDATE" => Ok(Intent::Update),
            "DELETE" => Ok(Intent::Delete),
            "UNKNOWN" => Ok(Intent::Unknown),
            _ => Err(TagError::Intent(s.to_string())),
        }
    }
}

// ============================================================================
// VALUES
// ============================================================================

/// A scalar value extracted from text, collected in a dialogue or read from a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        FieldValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric view of the value. Text is parsed leniently (surrounding
    /// whitespace ignored) the way a database compares a literal to a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Int(i) => Some(*i as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// Floats always carry a fractional part when printed (`3000.0`, not `3000`)
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("NULL"),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(v) => f.write_str(&format_float(*v)),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

// ============================================================================
// CONDITIONS
// ============================================================================

/// Comparison or assignment operator carried by a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConditionOp {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    /// SET-clause assignment
    #[serde(rename = "=")]
    Assign,
}

impl ConditionOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ConditionOp::Gt => ">",
            ConditionOp::Lt => "<",
            ConditionOp::Eq => "==",
            ConditionOp::Ne => "!=",
            ConditionOp::Assign => "=",
        }
    }

    /// Symbol as it appears in SQL text
    pub fn sql_symbol(&self) -> &'static str {
        match self {
            ConditionOp::Eq | ConditionOp::Assign => "=",
            other => other.symbol(),
        }
    }
}

impl FromStr for ConditionOp {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            ">" => Ok(ConditionOp::Gt),
            "<" => Ok(ConditionOp::Lt),
            "==" => Ok(ConditionOp::Eq),
            "!=" => Ok(ConditionOp::Ne),
            "=" => Ok(ConditionOp::Assign),
            other => Err(TagError::Operator(other.to_string())),
        }
    }
}

impl fmt::Display for ConditionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// One `(field, op, value)` triple over a canonical column name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub op: ConditionOp,
    pub value: FieldValue,
}

impl Condition {
    pub fn new(field: impl Into<String>, op: ConditionOp, value: FieldValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }
}

/// SET and WHERE halves of an update parsed from a single utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateParams {
    /// Always carries [`ConditionOp::Assign`]
    pub set: Condition,
    /// Always carries [`ConditionOp::Eq`]
    pub filter: Condition,
}

// ============================================================================
// TABLE SCHEMA
// ============================================================================

/// Storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Numeric,
    Text,
    /// Calendar date written as `YYYY-MM-DD`
    Date,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Numeric)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "integer",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Text => "text",
            ColumnKind::Date => "date",
        }
    }
}

impl FromStr for ColumnKind {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "integer" => Ok(ColumnKind::Integer),
            "numeric" => Ok(ColumnKind::Numeric),
            "text" => Ok(ColumnKind::Text),
            "date" => Ok(ColumnKind::Date),
            other => Err(TagError::ColumnKind(other.to_string())),
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

/// Primary key synthesized as `max(existing) + 1`, or `start` on an empty table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPolicy {
    pub field: String,
    pub start: i64,
}

/// Static description of one table.
///
/// Invariants (checked when the vocabulary is loaded):
/// `required ∩ optional = ∅` and `required ∪ optional ⊆ fields()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub required: Vec<String>,
    #[serde(default)]
    pub optional: Vec<String>,
    /// Every column of the table, in declaration order
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub key: Option<KeyPolicy>,
}

impl TableSchema {
    /// All field names in declaration order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.columns.iter().any(|c| c.name == field)
    }

    pub fn kind_of(&self, field: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|c| c.name == field)
            .map(|c| c.kind)
    }

    /// Generated key field, else the first declared column
    pub fn primary_key(&self) -> Option<&str> {
        self.key
            .as_ref()
            .map(|k| k.field.as_str())
            .or_else(|| self.columns.first().map(|c| c.name.as_str()))
    }

    /// Required fields not yet present in `collected`, in schema order
    pub fn missing_required(&self, collected: &BTreeMap<String, FieldValue>) -> Vec<String> {
        self.required
            .iter()
            .filter(|f| !collected.contains_key(f.as_str()))
            .cloned()
            .collect()
    }
}

// ============================================================================
// CONVERSATION STATE
// ============================================================================

/// Caller-held record of an in-progress multi-turn operation.
///
/// Travels in the request and response payloads; the agent keeps no copy.
/// The empty state serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationState {
    #[serde(skip_serializing_if = "Intent::is_unknown")]
    pub intent: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data_collected: BTreeMap<String, FieldValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_fields: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_asked_field: Option<String>,
}

impl ConversationState {
    pub fn new(intent: Intent, table: Option<String>) -> Self {
        Self {
            intent,
            table,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// True while an INSERT or UPDATE is waiting for more input
    pub fn is_active(&self) -> bool {
        self.intent.is_multi_turn() && self.table.is_some()
    }
}

// ============================================================================
// RESPONSE ENVELOPE
// ============================================================================

/// Kind of answer the agent produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseType {
    DialogNeeded,
    QueryResult,
    QuerySuccess,
    Status,
    Error,
}

/// One display row: upper-cased column name to JSON scalar
pub type DisplayRow = serde_json::Map<String, serde_json::Value>;

/// The sole output contract of the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub agent_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_statement: Option<String>,
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<DisplayRow>>,
    #[serde(default)]
    pub conversation_state: ConversationState,
}

impl ResponseEnvelope {
    fn new(response_type: ResponseType, agent_text: impl Into<String>) -> Self {
        Self {
            agent_text: agent_text.into(),
            sql_statement: None,
            response_type,
            data: None,
            conversation_state: ConversationState::default(),
        }
    }

    /// Ask the caller for more input, handing back the state to continue from
    pub fn dialog(agent_text: impl Into<String>, state: ConversationState) -> Self {
        Self::new(ResponseType::DialogNeeded, agent_text).with_state(state)
    }

    pub fn error(agent_text: impl Into<String>) -> Self {
        Self::new(ResponseType::Error, agent_text)
    }

    pub fn status(agent_text: impl Into<String>) -> Self {
        Self::new(ResponseType::Status, agent_text)
    }

    pub fn success(agent_text: impl Into<String>) -> Self {
        Self::new(ResponseType::QuerySuccess, agent_text)
    }

    pub fn rows(agent_text: impl Into<String>, rows: Vec<DisplayRow>) -> Self {
        let mut envelope = Self::new(ResponseType::QueryResult, agent_text);
        envelope.data = Some(rows);
        envelope
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql_statement = Some(sql.into());
        self
    }

    pub fn with_data(mut self, rows: Vec<DisplayRow>) -> Self {
        self.data = Some(rows);
        self
    }

    pub fn with_state(mut self, state: ConversationState) -> Self {
        self.conversation_state = state;
        self
    }
}
