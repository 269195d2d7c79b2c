//! HR Agent - Spanish natural-language front end over an HR database
//!
//! A request such as "listar empleados que ganan más de 3000" is classified,
//! mapped to a table and a condition, executed against a [`RecordStore`] and
//! answered with a [`ResponseEnvelope`]: a message, the equivalent SQL, result
//! rows, and the conversation state for the next turn. INSERTs that lack
//! required fields turn into a slot-filling dialogue.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hr_agent::{HrAgent, MemoryStore};
//! use hr_nlu::Lexicon;
//! use hr_types::ConversationState;
//!
//! # async fn run() {
//! let lexicon = Arc::new(Lexicon::builtin().clone());
//! let store = Arc::new(MemoryStore::new(lexicon.schemas().iter().cloned()));
//! let agent = HrAgent::new(lexicon, store);
//!
//! let reply = agent
//!     .process("insertar region", ConversationState::default())
//!     .await;
//! let reply = agent
//!     .process("Oceania", reply.conversation_state)
//!     .await;
//! println!("{}", reply.agent_text);
//! # }
//! ```
//!
//! ## Crates
//!
//! - `hr_types` - shared data types and the response contract
//! - `hr-nlu` - vocabulary, classification and condition extraction
//! - `hr-agent` (this crate) - dialogue, execution, stores, HTTP

// Core error handling
pub mod error;

pub mod config;

// Dialogue controller and operation execution
pub mod agent;

// Presentation
pub mod mapper;
pub mod sql_display;

// Record stores (in-memory, PostgreSQL with `database`)
pub mod store;

// REST API (when enabled)
#[cfg(feature = "server")]
pub mod api;

pub use agent::HrAgent;
pub use config::{AgentConfig, ConfigError, DatabaseConfig};
pub use error::{AgentError, StoreError};
pub use mapper::map_record;
pub use store::{MemoryStore, Record, RecordStore, Values};

#[cfg(feature = "database")]
pub use store::PgRecordStore;

#[cfg(feature = "server")]
pub use api::create_router;
