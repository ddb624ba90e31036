//! Integration tests for ToolDispatcher over the plant fixture
//!
//! Exercises each catalogued tool end to end as the model would call it:
//! raw JSON arguments in, result envelope out.

mod common;

use std::sync::Arc;

use anyhow::Result;
use serde_json::{json, Value};

use assetgraph_core::{GraphAggregationEngine, ToolDispatcher};
use common::plant_graph;

async fn dispatcher() -> ToolDispatcher {
    ToolDispatcher::new(Arc::new(GraphAggregationEngine::new(plant_graph().await)))
}

async fn call(dispatcher: &ToolDispatcher, tool: &str, arguments: Value) -> Value {
    dispatcher.dispatch(tool, arguments).await.to_json()
}

// =========================================================================
// Lookup Tool Tests
// =========================================================================

#[tokio::test]
async fn test_get_node_by_name_prefix() -> Result<()> {
    let dispatcher = dispatcher().await;

    let result = call(
        &dispatcher,
        "get_node_by_name",
        json!({"name": "Hall", "name_match": "prefix"}),
    )
    .await;
    assert_eq!(result["ok"], true);
    assert_eq!(result["value"]["count"], 3);
    Ok(())
}

#[tokio::test]
async fn test_count_tools() -> Result<()> {
    let dispatcher = dispatcher().await;

    let by_label = call(&dispatcher, "count_by_label", json!({"label": "Asset"})).await;
    assert_eq!(by_label["value"]["total_count"], 5);

    let by_name = call(
        &dispatcher,
        "count_nodes_by_name",
        json!({"name": "pump", "name_match": "prefix", "label": "Asset"}),
    )
    .await;
    assert_eq!(by_name["value"]["total_count"], 3);

    let unknown = call(&dispatcher, "count_by_label", json!({"label": "Gadget"})).await;
    assert_eq!(unknown["ok"], false);
    assert!(unknown["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("label must be one of"));
    Ok(())
}

// =========================================================================
// Contents Tool Tests
// =========================================================================

#[tokio::test]
async fn test_contents_by_name_with_stringified_arguments() -> Result<()> {
    let dispatcher = dispatcher().await;

    let result = call(
        &dispatcher,
        "container_contents_count_by_name",
        json!({
            "name": "Hall",
            "name_match": "prefix",
            "label": "Location",
            "relationship_types": "['LOCATED_IN']",
            "target_label": "Asset",
            "validity_filter": "{\"current_only\": false}"
        }),
    )
    .await;
    assert_eq!(result["ok"], true);
    // Retired pump included once validity filtering is off
    assert_eq!(result["value"]["total_count"], 5);
    assert_eq!(result["value"]["nodes_count"], 2);
    Ok(())
}

#[tokio::test]
async fn test_contents_list_by_id() -> Result<()> {
    let dispatcher = dispatcher().await;

    let result = call(
        &dispatcher,
        "container_contents_list",
        json!({
            "start_node_id": "hall-1",
            "relationship_types": ["LOCATED_IN"],
            "include_attributes": ["name"],
            "limit": "1"
        }),
    )
    .await;
    assert_eq!(result["ok"], true);
    assert_eq!(result["value"]["result"].as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn test_contents_average_by_id() -> Result<()> {
    let dispatcher = dispatcher().await;

    let result = call(
        &dispatcher,
        "container_contents_count",
        json!({
            "start_node_id": "hall-1",
            "relationship_types": ["LOCATED_IN"],
            "aggregation": "avg",
            "property_name": "capacity"
        }),
    )
    .await;
    assert_eq!(result["ok"], true);
    assert_eq!(result["value"]["result"], 20.0);
    Ok(())
}

// =========================================================================
// Breakdown, Category and Schema Tool Tests
// =========================================================================

#[tokio::test]
async fn test_breakdown_tool_defaults_to_every_dimension() -> Result<()> {
    let dispatcher = dispatcher().await;

    let result = call(&dispatcher, "count_assets_breakdown", json!({})).await;
    assert_eq!(result["ok"], true);
    assert_eq!(result["value"]["container_type"], "Both");
    assert_eq!(result["value"]["total_count"], 4);
    assert_eq!(result["value"]["breakdown"].as_array().map(Vec::len), Some(3));
    Ok(())
}

#[tokio::test]
async fn test_category_tools() -> Result<()> {
    let dispatcher = dispatcher().await;

    let counts = call(
        &dispatcher,
        "count_assets_by_category",
        json!({"category_scope": "system"}),
    )
    .await;
    assert_eq!(counts["value"]["scopes"][0]["total_items"], 3);

    let listing = call(&dispatcher, "list_categories", json!({})).await;
    assert_eq!(listing["value"]["category_count"], 4);
    assert!(listing["value"]["hierarchy_description"]
        .as_str()
        .unwrap_or_default()
        .contains("Production Area"));
    Ok(())
}

#[tokio::test]
async fn test_schema_and_connections_tools() -> Result<()> {
    let dispatcher = dispatcher().await;

    let schema = call(&dispatcher, "get_schema", json!(null)).await;
    assert_eq!(schema["ok"], true);
    assert!(schema["value"]["relationship_types"]
        .as_array()
        .is_some_and(|types| types.contains(&json!("PART_OF_SYSTEM"))));

    let connections = call(
        &dispatcher,
        "describe_node_connections",
        json!({"name": "Cooling"}),
    )
    .await;
    assert_eq!(connections["value"]["incoming_count"], 3);
    assert_eq!(connections["value"]["outgoing_count"], 1);
    Ok(())
}

#[tokio::test]
async fn test_read_cypher_write_is_refused() -> Result<()> {
    let dispatcher = dispatcher().await;

    let result = call(
        &dispatcher,
        "read_cypher",
        json!({"query": "MATCH (n) DETACH DELETE n"}),
    )
    .await;
    assert_eq!(result["ok"], false);
    assert!(result["error"]
        .as_str()
        .unwrap_or_default()
        .starts_with("Read-only mode"));
    Ok(())
}
