//! AssetGraph HTTP server
//!
//! A thin axum layer over the orchestrator and the aggregation engine.
//!
//! # Endpoints
//!
//! - `POST /chat` - Answer a natural-language query with the audit trail
//! - `GET /tools` - The tool catalogue sent to the model
//! - `GET /health` - Liveness
//! - `POST /graph/reset-signal` - Invalidate the schema cache after a re-import
//! - `GET /graph/schema` - Labels, relationship types and property keys
//!
//! The server holds no per-request state. Each `/chat` call runs its own
//! conversation; requests share only the store's pool and the schema cache.

use std::sync::Arc;

use axum::{
    http::{header, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use assetgraph_core::{GraphAggregationEngine, Orchestrator};

mod chat_endpoints;
mod graph_endpoints;
mod http_error;

pub use http_error::HttpError;

/// Application state shared across all endpoints
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub engine: Arc<GraphAggregationEngine>,
}

impl AppState {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let engine = orchestrator.dispatcher().engine().clone();
        Self {
            orchestrator,
            engine,
        }
    }
}

/// Create the application router with all endpoint modules
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(chat_endpoints::routes(state.clone()))
        .merge(graph_endpoints::routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}

/// Bind and serve until the process is stopped.
pub async fn start_server(state: AppState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("{}:{}", host, port);
    tracing::info!("🚀 AssetGraph server starting on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
