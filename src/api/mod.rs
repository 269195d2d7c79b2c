//! REST API routes for the HR agent
//!
//! `POST /ask-agent` runs one conversational turn; the caller sends back the
//! `conversation_state` it received to continue a dialogue.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use hr_types::{ConversationState, ResponseEnvelope};
use serde::Deserialize;

use crate::agent::HrAgent;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub conversation_state: Option<ConversationState>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn ask_agent(
    State(agent): State<Arc<HrAgent>>,
    Json(req): Json<AskRequest>,
) -> (StatusCode, Json<ResponseEnvelope>) {
    let query = req.query.unwrap_or_default();
    if query.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ResponseEnvelope::error("Por favor, ingresa una consulta.")),
        );
    }

    let state = req.conversation_state.unwrap_or_default();
    let envelope = agent.process(&query, state).await;
    (StatusCode::OK, Json(envelope))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "hr-agent",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// ============================================================================
// Router Factory
// ============================================================================

/// Create the agent router
pub fn create_router(agent: Arc<HrAgent>) -> Router {
    Router::new()
        .route("/ask-agent", post(ask_agent))
        .route("/health", get(health_check))
        .with_state(agent)
}
