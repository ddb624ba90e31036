//! Graph maintenance endpoints
//!
//! - `GET /health`
//! - `POST /graph/reset-signal` - Called by the import tooling after the
//!   graph is cleared and reloaded
//! - `GET /graph/schema`

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use assetgraph_core::SchemaSummary;

use crate::{AppState, HttpError};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/graph/reset-signal", post(reset_signal))
        .route("/graph/schema", get(schema))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

async fn reset_signal(State(state): State<AppState>) -> Json<Value> {
    state.engine.invalidate_caches();
    tracing::info!("🔄 Graph reset signalled, schema cache invalidated");
    Json(json!({
        "status": "ok",
        "message": "Schema cache invalidated"
    }))
}

async fn schema(State(state): State<AppState>) -> Result<Json<SchemaSummary>, HttpError> {
    Ok(Json(state.engine.schema_introspection().await?))
}
