//! Chat and catalogue endpoints
//!
//! - `GET /` - Service banner with the available tool names
//! - `POST /chat` - Run the agent for one query
//! - `GET /tools` - Tool definitions as sent to the model

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use assetgraph_core::AgentOutcome;

use crate::{AppState, HttpError};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    /// Model identifier overriding the configured one
    #[serde(default)]
    pub model: Option<String>,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/chat", post(chat))
        .route("/tools", get(list_tools))
        .with_state(state)
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    let tools: Vec<String> = state
        .orchestrator
        .dispatcher()
        .definitions()
        .into_iter()
        .map(|d| d.name)
        .collect();
    Json(json!({
        "message": "AssetGraph RAG API",
        "version": env!("CARGO_PKG_VERSION"),
        "available_tools": tools,
    }))
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<AgentOutcome>, HttpError> {
    if request.query.trim().is_empty() {
        return Err(HttpError::new("Query cannot be empty", "INVALID_INPUT"));
    }
    let outcome = state
        .orchestrator
        .run(&request.query, request.model.as_deref())
        .await?;
    Ok(Json(outcome))
}

async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "tools": state.orchestrator.dispatcher().definitions()
    }))
}
