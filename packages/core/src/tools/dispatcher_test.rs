//! Tests for ToolDispatcher

use super::*;
use crate::db::MemoryGraph;
use crate::models::AggregateValue;
use crate::services::error::READ_ONLY_MESSAGE;
use serde_json::json;

async fn dispatcher() -> (Arc<MemoryGraph>, ToolDispatcher) {
    let graph = Arc::new(MemoryGraph::new());
    let hall = graph
        .add_node(&["Location"], json!({"name": "Hall 1", "fingerprint": "AA_H01"}))
        .await;
    for name in ["Pump 1", "Pump 2"] {
        let pump = graph.add_node(&["Asset"], json!({"name": name})).await;
        graph.relate(&pump, "LOCATED_IN", &hall, json!({})).await;
    }
    let engine = Arc::new(GraphAggregationEngine::new(graph.clone()));
    (graph, ToolDispatcher::new(engine))
}

struct SignalQuery;

#[async_trait]
impl Collaborator for SignalQuery {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "query_signals",
            "Time-series values for a signal",
            json!({
                "type": "object",
                "properties": {"signal_ids": {"type": "array", "items": {"type": "string"}}},
                "required": ["signal_ids"]
            }),
        )
    }

    async fn call(&self, arguments: Value) -> Result<Value, ToolError> {
        let ids = arguments["signal_ids"].as_array().cloned().unwrap_or_default();
        Ok(json!({"found": !ids.is_empty(), "series": ids}))
    }
}

#[tokio::test]
async fn test_unknown_tool_is_a_failure_envelope() {
    let (_, dispatcher) = dispatcher().await;
    let outcome = dispatcher.dispatch("delete_graph", json!({})).await;
    assert!(!outcome.is_ok());
    assert_eq!(outcome.error(), Some("Tool 'delete_graph' not found"));
}

#[tokio::test]
async fn test_stringified_array_is_coerced_before_dispatch() {
    let (_, dispatcher) = dispatcher().await;
    let outcome = dispatcher
        .dispatch(
            "container_contents_count_by_name",
            json!({
                "name": "hall 1",
                "relationship_types": "[\"LOCATED_IN\"]",
                "target_label": "Asset"
            }),
        )
        .await;
    assert!(outcome.is_success(), "{:?}", outcome.error());
    match outcome.payload() {
        Some(ToolPayload::Aggregation(result)) => {
            assert_eq!(result.nodes_count, 1);
            assert_eq!(result.total_count, 2);
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_required_parameter() {
    let (_, dispatcher) = dispatcher().await;
    let outcome = dispatcher.dispatch("count_by_label", json!({})).await;
    assert_eq!(
        outcome.error(),
        Some("Invalid parameters for 'count_by_label': missing required parameter 'label'")
    );
}

#[tokio::test]
async fn test_uncoercible_value_fails_the_shape_check() {
    let (_, dispatcher) = dispatcher().await;
    let outcome = dispatcher
        .dispatch(
            "container_contents_count_by_name",
            json!({"name": "Hall 1", "relationship_types": "LOCATED_IN"}),
        )
        .await;
    let error = outcome.error().unwrap_or_default();
    assert!(error.contains("'relationship_types' must be of type array"), "{}", error);
}

#[tokio::test]
async fn test_engine_validation_reaches_the_envelope() {
    let (_, dispatcher) = dispatcher().await;
    let outcome = dispatcher
        .dispatch(
            "container_contents_count_by_name",
            json!({"name": "Hall 1", "relationship_types": []}),
        )
        .await;
    assert_eq!(outcome.error(), Some("relationship_types cannot be empty"));
    assert_eq!(
        outcome.to_json(),
        json!({"ok": false, "error": "relationship_types cannot be empty"})
    );
}

#[tokio::test]
async fn test_node_id_tools_use_lookup_result() {
    let (_, dispatcher) = dispatcher().await;
    let lookup = dispatcher
        .dispatch("get_node_by_name", json!({"name": "Hall 1", "mode": "first"}))
        .await;
    let node_id = match lookup.payload() {
        Some(ToolPayload::Lookup(found)) => found.nodes[0].node_id.clone(),
        other => panic!("unexpected payload: {:?}", other),
    };

    let listed = dispatcher
        .dispatch(
            "container_contents_list",
            json!({
                "start_node_id": node_id,
                "relationship_types": ["LOCATED_IN"],
                "include_attributes": "['name']"
            }),
        )
        .await;
    match listed.payload() {
        Some(ToolPayload::NodeAggregate(result)) => match &result.result {
            AggregateValue::Rows(rows) => {
                assert_eq!(rows.len(), 2);
                assert!(rows.iter().all(|r| r.contains_key("name")));
            }
            other => panic!("expected rows, got {:?}", other),
        },
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_raw_query_never_reaches_the_store() {
    let (graph, dispatcher) = dispatcher().await;
    let outcome = dispatcher
        .dispatch("read_cypher", json!({"query": "MATCH (n) DETACH DELETE n"}))
        .await;
    assert_eq!(outcome.error(), Some(READ_ONLY_MESSAGE));
    assert!(graph.raw_queries().await.is_empty());
}

#[tokio::test]
async fn test_collaborator_tools_join_the_catalogue() {
    let (_, dispatcher) = dispatcher().await;
    let dispatcher = dispatcher.with_collaborator(Arc::new(SignalQuery));
    let names: Vec<String> = dispatcher.definitions().into_iter().map(|d| d.name).collect();
    assert_eq!(names.len(), GraphTool::ALL.len() + 1);
    assert_eq!(names.last().map(String::as_str), Some("query_signals"));

    let outcome = dispatcher
        .dispatch("query_signals", json!({"signal_ids": "[\"s-1\"]"}))
        .await;
    assert!(outcome.is_success());
    assert_eq!(
        outcome.to_json(),
        json!({"ok": true, "value": {"found": true, "series": ["s-1"]}})
    );
}
