//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use assetgraph_core::{GraphAggregationEngine, MemoryGraph};

pub const PLANT_FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/plant.json");

/// Route engine logs to the test output; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Plant graph: Site A holds Hall 1 and Hall 2, Hall 1 holds two current
/// pumps and one retired pump, Hall 2 holds a pump and the hallway sensor.
pub async fn plant_graph() -> Arc<MemoryGraph> {
    init_tracing();
    Arc::new(
        MemoryGraph::from_file(PLANT_FIXTURE)
            .await
            .expect("plant fixture should load"),
    )
}

pub async fn plant_engine() -> (Arc<MemoryGraph>, GraphAggregationEngine) {
    let graph = plant_graph().await;
    let engine = GraphAggregationEngine::new(graph.clone());
    (graph, engine)
}
