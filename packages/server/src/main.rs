//! AssetGraph server binary
//!
//! # Environment Variables
//!
//! - `NEO4J_URI`, `NEO4J_USER`, `NEO4J_PASSWORD`, `NEO4J_DATABASE`: graph connection
//! - `GRAPH_FIXTURE`: serve a JSON graph fixture from memory instead of Neo4j
//! - `ANTHROPIC_API_KEY` (or `CLAUDE_API_KEY`), `CLAUDE_MODEL`: model access
//! - `SERVER_HOST`, `SERVER_PORT`: bind address (default 0.0.0.0:8000)
//! - `RUST_LOG`: logging level (default "info")

use std::sync::Arc;

use anyhow::Context;

use assetgraph_core::agent::OrchestratorSettings;
use assetgraph_core::{
    AnthropicClient, AppConfig, GraphAggregationEngine, GraphStore, MemoryGraph, Neo4jStore,
    Orchestrator, ToolDispatcher,
};
use assetgraph_server::{start_server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("🚀 AssetGraph Server");
    tracing::info!("==================================");

    let config = AppConfig::from_env().context("Failed to read configuration")?;

    let store: Arc<dyn GraphStore> = match &config.graph_fixture {
        Some(path) => {
            tracing::info!("📂 Serving graph fixture from {}", path);
            Arc::new(
                MemoryGraph::from_file(path)
                    .await
                    .with_context(|| format!("Failed to load graph fixture {}", path))?,
            )
        }
        None => {
            tracing::info!("🔌 Neo4j at {}", config.neo4j.uri);
            Arc::new(Neo4jStore::new(config.neo4j.clone()))
        }
    };

    let engine = Arc::new(
        GraphAggregationEngine::new(store).with_raw_query_limit(config.raw_query_limit),
    );
    let dispatcher = Arc::new(ToolDispatcher::new(engine));
    let model = Arc::new(
        AnthropicClient::from_settings(&config.model).context("Model client unavailable")?,
    );
    let orchestrator = Arc::new(Orchestrator::new(
        model,
        dispatcher,
        OrchestratorSettings::from(&config),
    ));

    tracing::info!(
        "🤖 Model {} (max {} pass(es))",
        config.model.model,
        config.agent.max_iterations
    );
    start_server(AppState::new(orchestrator), &config.server_host, config.server_port).await
}
