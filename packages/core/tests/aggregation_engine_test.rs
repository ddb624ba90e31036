//! Integration tests for GraphAggregationEngine over the plant fixture
//!
//! Tests cover:
//! - Name resolution in first and all modes, exact and prefix
//! - Incoming aggregation with validity filtering
//! - Totals folding back to the per-node results
//! - Breakdowns, category counts and category listings
//! - Connection descriptions
//! - The read-only raw query gate

mod common;

use anyhow::Result;
use assetgraph_core::{
    AggregateValue, AggregationKind, AggregationRequest, BreakdownDimension, CategoryScope,
    ConnectionDirection, IncomingAggregation, MatchMode, ResolveMode, ResolveRequest,
    TotalValue, ValiditySpec,
};
use common::plant_engine;

fn located_in() -> IncomingAggregation {
    IncomingAggregation::count(vec!["LOCATED_IN".to_string()]).with_target_label("Asset")
}

// =========================================================================
// Name Resolution Tests
// =========================================================================

#[tokio::test]
async fn test_exact_lookup_is_case_insensitive() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let lookup = engine.lookup(&ResolveRequest::new("hall 1"), None).await?;
    assert!(lookup.found);
    assert_eq!(lookup.count, 1);
    assert_eq!(lookup.nodes[0].node_id, "hall-1");
    assert_eq!(lookup.nodes[0].label, "Location");
    Ok(())
}

#[tokio::test]
async fn test_prefix_lookup_spans_labels_in_priority_order() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let request = ResolveRequest::new("Hall").with_match_mode(MatchMode::Prefix);
    let names: Vec<_> = engine
        .resolve_by_name(&request)
        .await?
        .iter()
        .map(|n| n.name().unwrap_or_default().to_string())
        .collect();
    assert_eq!(names, vec!["Hall 1", "Hall 2", "Hallway Sensor"]);

    let first = engine
        .resolve_by_name(&request.clone().with_mode(ResolveMode::First))
        .await?;
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].name(), Some("Hall 1"));
    Ok(())
}

#[tokio::test]
async fn test_lookup_projects_requested_attributes() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let keys = vec!["fingerprint".to_string()];
    let lookup = engine
        .lookup(&ResolveRequest::new("Pump 2"), Some(&keys))
        .await?;
    let attributes = &lookup.nodes[0].attributes;
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes["fingerprint"], "P2");
    Ok(())
}

#[tokio::test]
async fn test_unknown_name_is_not_an_error() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let lookup = engine.lookup(&ResolveRequest::new("Hall 9"), None).await?;
    assert!(!lookup.found);
    assert_eq!(lookup.count, 0);
    Ok(())
}

#[tokio::test]
async fn test_counts_by_name_and_label() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let by_name = engine.count_by_name("Pump", None, MatchMode::Prefix).await?;
    assert_eq!(by_name.total_count, 3);
    assert!(by_name
        .by_label
        .iter()
        .any(|t| t.label == "Asset" && t.count == 3));

    let by_label = engine.count_by_label("Asset").await?;
    assert_eq!(by_label.total_count, 5);

    let err = engine.count_by_label("Gadget").await.unwrap_err();
    assert!(err.is_validation());
    Ok(())
}

// =========================================================================
// Aggregation Tests
// =========================================================================

#[tokio::test]
async fn test_current_only_count_excludes_ended_relationships() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let result = engine
        .aggregate(&AggregationRequest::new("Hall 1", located_in()))
        .await?;
    assert!(result.found);
    assert_eq!(result.nodes_count, 1);
    assert_eq!(result.total_count, 2);
    assert_eq!(result.total_result, TotalValue::Count(2));

    let unfiltered = engine
        .aggregate(&AggregationRequest::new(
            "Hall 1",
            located_in().with_validity(ValiditySpec::unfiltered()),
        ))
        .await?;
    assert_eq!(unfiltered.total_count, 3);
    Ok(())
}

#[tokio::test]
async fn test_as_of_count_uses_validity_interval() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let mid_2019 = engine
        .aggregate(&AggregationRequest::new(
            "Hall 1",
            located_in().with_validity(ValiditySpec::as_of("2019-06-01")),
        ))
        .await?;
    // Pump 1 and the retired pump; Pump 2 arrives in 2020
    assert_eq!(mid_2019.total_count, 2);

    let early_2021 = engine
        .aggregate(&AggregationRequest::new(
            "Hall 1",
            located_in().with_validity(ValiditySpec::as_of("2021-01-01T00:00:00Z")),
        ))
        .await?;
    assert_eq!(early_2021.total_count, 3);

    let err = engine
        .aggregate(&AggregationRequest::new(
            "Hall 1",
            located_in().with_validity(ValiditySpec::as_of("last tuesday")),
        ))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    Ok(())
}

#[tokio::test]
async fn test_prefix_count_sums_every_matching_container() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let result = engine
        .aggregate(&AggregationRequest::new("Hall", located_in()).with_match_mode(MatchMode::Prefix))
        .await?;
    assert_eq!(result.nodes_count, 3);
    assert_eq!(result.total_count, 4);

    let per_node: u64 = result
        .per_node
        .iter()
        .map(|p| p.result.measure() as u64)
        .sum();
    assert_eq!(per_node, result.total_count);
    assert!(result.summary_table.contains("| AA_H01 | 2 |"));
    assert!(result.summary_table.contains("| HS1 | 0 |"));
    assert!(result.summary_table.ends_with("| **Total** | **4** |"));
    Ok(())
}

#[tokio::test]
async fn test_statistics_fold_consistently_with_per_node_results() -> Result<()> {
    let (_graph, engine) = plant_engine().await;
    let request = |kind| {
        AggregationRequest::new(
            "Hall",
            located_in().with_kind(kind).with_property("capacity"),
        )
        .with_match_mode(MatchMode::Prefix)
    };

    let sum = engine.aggregate(&request(AggregationKind::Sum)).await?;
    let per_node_sum: f64 = sum.per_node.iter().map(|p| p.result.measure()).sum();
    assert_eq!(sum.total_result, TotalValue::Statistic(Some(45.0)));
    assert_eq!(per_node_sum, 45.0);

    // Hall 1 averages 20 over two pumps, Hall 2 averages 5 over one
    let avg = engine.aggregate(&request(AggregationKind::Avg)).await?;
    assert_eq!(avg.total_result, TotalValue::Statistic(Some(15.0)));

    let max = engine.aggregate(&request(AggregationKind::Max)).await?;
    assert_eq!(max.total_result, TotalValue::Statistic(Some(30.0)));
    let min = engine.aggregate(&request(AggregationKind::Min)).await?;
    assert_eq!(min.total_result, TotalValue::Statistic(Some(5.0)));
    Ok(())
}

#[tokio::test]
async fn test_list_returns_item_rows() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let mut aggregation = located_in().with_kind(AggregationKind::List);
    aggregation.include_attributes = Some(vec!["name".to_string()]);
    let result = engine
        .aggregate(&AggregationRequest::new("Hall 2", aggregation))
        .await?;

    let AggregateValue::Rows(rows) = &result.per_node[0].result else {
        panic!("expected rows, got {:?}", result.per_node[0].result);
    };
    let names: Vec<_> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Pump 3", "Hallway Sensor"]);
    assert!(rows.iter().all(|r| r.contains_key("node_id")));
    assert_eq!(result.total_count, 2);
    Ok(())
}

#[tokio::test]
async fn test_parent_scope_restricts_containers() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let scoped = engine
        .aggregate(
            &AggregationRequest::new("Hall", located_in())
                .with_match_mode(MatchMode::Prefix)
                .with_label("Location")
                .with_parent_scope("Site A"),
        )
        .await?;
    assert_eq!(scoped.nodes_count, 2);

    let elsewhere = engine
        .aggregate(
            &AggregationRequest::new("Hall", located_in())
                .with_match_mode(MatchMode::Prefix)
                .with_label("Location")
                .with_parent_scope("Site B"),
        )
        .await?;
    assert!(!elsewhere.found);
    assert_eq!(elsewhere.total_count, 0);
    Ok(())
}

#[tokio::test]
async fn test_empty_relationship_types_are_rejected() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let err = engine
        .aggregate(&AggregationRequest::new(
            "Hall 1",
            IncomingAggregation::count(Vec::new()),
        ))
        .await
        .unwrap_err();
    assert!(err.is_validation());
    Ok(())
}

#[tokio::test]
async fn test_aggregate_node_by_id() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let result = engine.aggregate_node("hall-2", &located_in()).await?;
    assert_eq!(result.result, AggregateValue::Count(2));
    assert_eq!(result.target_nodes_found, 2);

    let missing = engine.aggregate_node("nowhere", &located_in()).await?;
    assert_eq!(missing.result, AggregateValue::Count(0));
    Ok(())
}

// =========================================================================
// Breakdown and Category Tests
// =========================================================================

#[tokio::test]
async fn test_location_breakdown() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let result = engine
        .count_breakdown(BreakdownDimension::Location, &ValiditySpec::current())
        .await?;
    assert_eq!(result.total_count, 4);
    let per_container: Vec<_> = result.breakdown[0]
        .per_container
        .iter()
        .map(|c| (c.fingerprint.clone().unwrap_or_default(), c.count))
        .collect();
    assert_eq!(
        per_container,
        vec![
            ("AA".to_string(), 0),
            ("AA_H01".to_string(), 2),
            ("AA_H02".to_string(), 2)
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_breakdown_across_all_dimensions_takes_largest_total() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let result = engine
        .count_breakdown(BreakdownDimension::Both, &ValiditySpec::current())
        .await?;
    let totals: Vec<_> = result
        .breakdown
        .iter()
        .map(|b| (b.dimension, b.total_result))
        .collect();
    assert_eq!(
        totals,
        vec![
            (BreakdownDimension::Location, 4),
            (BreakdownDimension::System, 3),
            (BreakdownDimension::Context, 1),
        ]
    );
    assert_eq!(result.total_count, 4);
    assert!(result.summary_table.contains("**By System**"));
    Ok(())
}

#[tokio::test]
async fn test_category_counts() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let result = engine
        .count_by_category(CategoryScope::Both, &ValiditySpec::current())
        .await?;
    let location = &result.scopes[0];
    assert_eq!(location.scope, CategoryScope::Location);
    let counts: Vec<_> = location
        .categories
        .iter()
        .map(|c| (c.category_name.as_str(), c.item_count, c.member_count))
        .collect();
    assert_eq!(counts, vec![("Production Area", 2, 1), ("Utilities", 2, 1)]);
    assert_eq!(location.total_items, 4);

    let system = &result.scopes[1];
    assert_eq!(system.categories[0].category_name, "HVAC");
    assert_eq!(system.total_items, 3);
    Ok(())
}

#[tokio::test]
async fn test_list_categories_with_hierarchy() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let listing = engine.list_categories(true).await?;
    assert_eq!(listing.category_count, 4);
    let hierarchy = listing.category_hierarchy.unwrap_or_default();
    assert_eq!(hierarchy.len(), 1);
    assert_eq!(hierarchy[0].from_category, "Production Area");
    assert_eq!(hierarchy[0].to_category, "Plant Areas");

    let flat = engine.list_categories(false).await?;
    assert!(flat.category_hierarchy.is_none());
    Ok(())
}

// =========================================================================
// Connections Tests
// =========================================================================

#[tokio::test]
async fn test_describe_connections() -> Result<()> {
    let (_graph, engine) = plant_engine().await;

    let result = engine.describe_connections("Hall 1", false).await?;
    assert!(result.found);
    assert_eq!(result.incoming_count, 3);
    assert_eq!(result.outgoing_count, 2);
    assert!(result
        .incoming
        .iter()
        .all(|c| c.direction == ConnectionDirection::Incoming));
    let outgoing: Vec<_> = result
        .outgoing
        .iter()
        .map(|c| c.relationship_type.as_str())
        .collect();
    assert_eq!(outgoing, vec!["BELONGS_TO_LOCATION_CATEGORY", "LOCATED_IN"]);
    assert!(result.attributes.is_none());

    let missing = engine.describe_connections("Nowhere", false).await?;
    assert!(!missing.found);
    assert!(missing
        .message
        .unwrap_or_default()
        .starts_with("No node found"));
    Ok(())
}

// =========================================================================
// Raw Query and Cache Tests
// =========================================================================

#[tokio::test]
async fn test_raw_query_gate() -> Result<()> {
    let (graph, engine) = plant_engine().await;

    let err = engine
        .raw_query("CREATE INDEX foo FOR (n:Asset) ON (n.name)", None)
        .await
        .unwrap_err();
    assert!(err.is_validation());
    assert!(graph.raw_queries().await.is_empty());

    let result = engine
        .raw_query("MATCH (n:Asset) RETURN n.name", Some(5))
        .await?;
    assert_eq!(result.query, "MATCH (n:Asset) RETURN n.name LIMIT 5");
    assert_eq!(graph.raw_queries().await, vec![result.query.clone()]);
    Ok(())
}

#[tokio::test]
async fn test_schema_follows_graph_after_invalidation() -> Result<()> {
    let (graph, engine) = plant_engine().await;

    let before = engine.known_labels().await?;
    assert!(!before.contains(&"Signal".to_string()));

    graph
        .add_node(&["Signal"], serde_json::json!({"name": "Flow"}))
        .await;
    engine.invalidate_caches();

    let schema = engine.schema_introspection().await?;
    assert!(schema.labels.contains(&"Signal".to_string()));
    Ok(())
}
