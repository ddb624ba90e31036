//! Tool Dispatcher
//!
//! Maps a `(tool name, raw arguments)` pair from the model to an engine
//! operation and wraps the result in a [`ToolOutcome`].
//!
//! # Pipeline
//!
//! 1. Look up the tool (built-in [`GraphTool`] first, then collaborators)
//! 2. Coerce arguments against the declared schema
//! 3. Check the argument shape: required keys and declared JSON types
//! 4. Deserialize typed parameters and invoke the operation
//! 5. Wrap the payload, or the error message, in the envelope
//!
//! Nothing in this pipeline returns an `Err` to the caller. Unknown tools,
//! bad arguments, validation and database failures all become failure
//! envelopes that go back to the model as tool results.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use super::catalogue::{graph_tool_definitions, GraphTool, ToolDefinition};
use super::coercion::coerce_arguments;
use super::envelope::{ToolOutcome, ToolPayload};
use super::error::ToolError;
use super::params::{
    BreakdownParams, CategoryCountParams, ContentsByIdParams, ContentsByNameParams,
    CountByLabelParams, CountNodesByNameParams, DescribeConnectionsParams, GetNodeByNameParams,
    ListCategoriesParams, ReadCypherParams,
};
use crate::models::{AggregationKind, AggregationRequest, IncomingAggregation, ResolveRequest};
use crate::services::GraphAggregationEngine;

/// An externally provided tool, such as a time-series signal query.
#[async_trait]
pub trait Collaborator: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn call(&self, arguments: Value) -> Result<Value, ToolError>;
}

pub struct ToolDispatcher {
    engine: Arc<GraphAggregationEngine>,
    collaborators: Vec<Arc<dyn Collaborator>>,
}

impl ToolDispatcher {
    pub fn new(engine: Arc<GraphAggregationEngine>) -> Self {
        Self {
            engine,
            collaborators: Vec::new(),
        }
    }

    /// Register a collaborator tool. Names that clash with a catalogued tool
    /// are ignored.
    pub fn with_collaborator(mut self, collaborator: Arc<dyn Collaborator>) -> Self {
        let name = collaborator.definition().name;
        if GraphTool::from_name(&name).is_some() || self.collaborator(&name).is_some() {
            warn!("⚠️ Collaborator tool '{}' clashes with an existing tool, skipped", name);
            return self;
        }
        info!("🔌 Registered collaborator tool: {}", name);
        self.collaborators.push(collaborator);
        self
    }

    pub fn engine(&self) -> &Arc<GraphAggregationEngine> {
        &self.engine
    }

    /// Full catalogue: built-in tools followed by collaborators.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions = graph_tool_definitions();
        definitions.extend(self.collaborators.iter().map(|c| c.definition()));
        definitions
    }

    fn collaborator(&self, name: &str) -> Option<&Arc<dyn Collaborator>> {
        self.collaborators
            .iter()
            .find(|c| c.definition().name == name)
    }

    /// Run one tool call and wrap the result.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolOutcome {
        info!("🔧 Executing tool: {}", name);
        match self.execute(name, arguments).await {
            Ok(payload) => ToolOutcome::success(payload),
            Err(e) => {
                warn!("⚠️ Tool '{}' failed: {}", name, e);
                ToolOutcome::failure(e.to_string())
            }
        }
    }

    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolPayload, ToolError> {
        if let Some(tool) = GraphTool::from_name(name) {
            let arguments = prepare(&tool.definition(), arguments)?;
            return self.run_graph_tool(tool, arguments).await;
        }
        if let Some(collaborator) = self.collaborator(name) {
            let arguments = prepare(&collaborator.definition(), arguments)?;
            return collaborator.call(arguments).await.map(ToolPayload::External);
        }
        Err(ToolError::unknown_tool(name))
    }

    async fn run_graph_tool(
        &self,
        tool: GraphTool,
        arguments: Value,
    ) -> Result<ToolPayload, ToolError> {
        let engine = &self.engine;
        let payload = match tool {
            GraphTool::GetNodeByName => {
                let p: GetNodeByNameParams = parse(tool, arguments)?;
                let request = ResolveRequest::new(p.name)
                    .with_label(p.label)
                    .with_match_mode(p.name_match)
                    .with_mode(p.mode)
                    .with_parent_scope(p.parent_location_name);
                ToolPayload::Lookup(
                    engine
                        .lookup(&request, p.include_attributes.as_deref())
                        .await?,
                )
            }
            GraphTool::CountNodesByName => {
                let p: CountNodesByNameParams = parse(tool, arguments)?;
                ToolPayload::NameCount(
                    engine
                        .count_by_name(&p.name, p.label.as_deref(), p.name_match)
                        .await?,
                )
            }
            GraphTool::CountByLabel => {
                let p: CountByLabelParams = parse(tool, arguments)?;
                ToolPayload::LabelCount(engine.count_by_label(&p.label).await?)
            }
            GraphTool::GetSchema => ToolPayload::Schema(engine.schema_introspection().await?),
            GraphTool::ListCategories => {
                let p: ListCategoriesParams = parse(tool, arguments)?;
                ToolPayload::Categories(engine.list_categories(p.include_hierarchy).await?)
            }
            GraphTool::DescribeNodeConnections => {
                let p: DescribeConnectionsParams = parse(tool, arguments)?;
                ToolPayload::Connections(
                    engine
                        .describe_connections(&p.name, p.include_attributes)
                        .await?,
                )
            }
            GraphTool::ContainerContentsCountByName => {
                let p: ContentsByNameParams = parse(tool, arguments)?;
                let request = by_name_request(p, AggregationKind::Count);
                ToolPayload::Aggregation(engine.aggregate(&request).await?)
            }
            GraphTool::ContainerContentsListByName => {
                let p: ContentsByNameParams = parse(tool, arguments)?;
                let request = by_name_request(p, AggregationKind::List);
                ToolPayload::Aggregation(engine.aggregate(&request).await?)
            }
            GraphTool::ContainerContentsCount => {
                let p: ContentsByIdParams = parse(tool, arguments)?;
                let kind = p.aggregation;
                let (node_id, aggregation) = by_id_aggregation(p, kind);
                ToolPayload::NodeAggregate(engine.aggregate_node(&node_id, &aggregation).await?)
            }
            GraphTool::ContainerContentsList => {
                let p: ContentsByIdParams = parse(tool, arguments)?;
                let (node_id, aggregation) = by_id_aggregation(p, AggregationKind::List);
                ToolPayload::NodeAggregate(engine.aggregate_node(&node_id, &aggregation).await?)
            }
            GraphTool::CountAssetsBreakdown => {
                let p: BreakdownParams = parse(tool, arguments)?;
                let validity = p.validity_filter.unwrap_or_default();
                ToolPayload::Breakdown(engine.count_breakdown(p.container_type, &validity).await?)
            }
            GraphTool::CountAssetsByCategory => {
                let p: CategoryCountParams = parse(tool, arguments)?;
                let validity = p.validity_filter.unwrap_or_default();
                ToolPayload::CategoryCounts(
                    engine
                        .count_by_category(p.category_scope, &validity)
                        .await?,
                )
            }
            GraphTool::ReadCypher => {
                let p: ReadCypherParams = parse(tool, arguments)?;
                ToolPayload::RawRows(engine.raw_query(&p.query, p.limit).await?)
            }
        };
        Ok(payload)
    }
}

fn by_name_request(p: ContentsByNameParams, kind: AggregationKind) -> AggregationRequest {
    let aggregation = IncomingAggregation {
        relationship_types: p.relationship_types,
        target_label: p.target_label,
        kind,
        property_name: None,
        validity: p.validity_filter.unwrap_or_default(),
        limit: p.limit,
        include_attributes: p.include_attributes,
    };
    AggregationRequest {
        name: p.name,
        label: p.label,
        match_mode: p.name_match,
        parent_scope: p.parent_location_name,
        aggregation,
    }
}

fn by_id_aggregation(p: ContentsByIdParams, kind: AggregationKind) -> (String, IncomingAggregation) {
    let aggregation = IncomingAggregation {
        relationship_types: p.relationship_types,
        target_label: p.target_label,
        kind,
        property_name: p.property_name,
        validity: p.validity_filter.unwrap_or_default(),
        limit: p.limit,
        include_attributes: p.include_attributes,
    };
    (p.start_node_id, aggregation)
}

/// Coerce, then check the shape against the declared schema.
fn prepare(definition: &ToolDefinition, arguments: Value) -> Result<Value, ToolError> {
    let arguments = coerce_arguments(definition, arguments);
    check_shape(definition, &arguments)?;
    Ok(arguments)
}

/// Required keys are present and every declared key has its declared type.
pub(crate) fn check_shape(definition: &ToolDefinition, arguments: &Value) -> Result<(), ToolError> {
    let Some(map) = arguments.as_object() else {
        return Err(ToolError::invalid_params(
            &definition.name,
            "arguments must be a JSON object",
        ));
    };
    for required in definition.required_parameters() {
        if map.get(required).map_or(true, Value::is_null) {
            return Err(ToolError::invalid_params(
                &definition.name,
                format!("missing required parameter '{}'", required),
            ));
        }
    }
    for (key, value) in map {
        if value.is_null() {
            continue;
        }
        if let Some(expected) = definition.parameter_type(key) {
            if !matches_type(expected, value) {
                return Err(ToolError::invalid_params(
                    &definition.name,
                    format!("'{}' must be of type {}", key, expected),
                ));
            }
        }
    }
    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        _ => true,
    }
}

fn parse<P: DeserializeOwned>(tool: GraphTool, arguments: Value) -> Result<P, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::invalid_params(tool.name(), e.to_string()))
}

#[cfg(test)]
#[path = "dispatcher_test.rs"]
mod dispatcher_test;
