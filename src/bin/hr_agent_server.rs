//! HR Agent REST API Server
//!
//! ## Usage
//!
//! ```bash
//! # In-memory store
//! cargo run --bin hr_agent_server
//!
//! # PostgreSQL store
//! DATABASE_URL=postgresql://localhost/hr cargo run --bin hr_agent_server --features database
//!
//! curl -X POST http://localhost:5000/ask-agent \
//!   -H "Content-Type: application/json" \
//!   -d '{"query": "listar empleados que ganan más de 3000", "conversation_state": {}}'
//!
//! curl http://localhost:5000/health
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use hr_agent::{create_router, store, AgentConfig, HrAgent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hr_agent=debug,tower_http=info".into()),
        )
        .init();

    let config = AgentConfig::from_env().context("invalid configuration")?;
    let lexicon = config.load_lexicon().context("failed to load vocabulary")?;
    let store = store::connect(&config, &lexicon)
        .await
        .context("failed to open record store")?;

    let agent = Arc::new(HrAgent::new(lexicon, store).with_result_limit(config.result_limit));

    // Create router with CORS and tracing
    let app = create_router(agent)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("HR agent listening on http://{}", config.bind_addr);
    tracing::info!("  POST /ask-agent");
    tracing::info!("  GET  /health");

    axum::serve(listener, app).await?;

    Ok(())
}
