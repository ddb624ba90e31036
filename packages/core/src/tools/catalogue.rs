//! Tool Catalogue
//!
//! The fixed set of graph tools the model may call. Every tool is a variant
//! of [`GraphTool`] and carries its own description and JSON input schema,
//! so adding a tool without a schema or a dispatch arm does not compile.
//!
//! Tools are grouped into categories for the `/tools` listing:
//! - **Lookup**: name resolution and node counts
//! - **Contents**: incoming-edge aggregations at containers
//! - **Breakdown**: per-container and per-category item counts
//! - **Schema**: labels, relationship types, categories
//! - **Query**: the read-only Cypher fallback

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tool category for grouping in listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCategory {
    Lookup,
    Contents,
    Breakdown,
    Schema,
    Query,
    /// Registered by a collaborator rather than built in
    External,
}

/// One tool as the model sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }

    /// JSON type declared for a parameter, if any.
    pub fn parameter_type(&self, parameter: &str) -> Option<&str> {
        self.input_schema["properties"][parameter]["type"].as_str()
    }

    /// Names listed under `required`.
    pub fn required_parameters(&self) -> Vec<&str> {
        self.input_schema["required"]
            .as_array()
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// Built-in graph tools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GraphTool {
    GetNodeByName,
    CountNodesByName,
    CountByLabel,
    GetSchema,
    ListCategories,
    DescribeNodeConnections,
    ContainerContentsCountByName,
    ContainerContentsListByName,
    ContainerContentsCount,
    ContainerContentsList,
    CountAssetsBreakdown,
    CountAssetsByCategory,
    ReadCypher,
}

impl GraphTool {
    pub const ALL: [GraphTool; 13] = [
        GraphTool::GetNodeByName,
        GraphTool::CountNodesByName,
        GraphTool::CountByLabel,
        GraphTool::ListCategories,
        GraphTool::DescribeNodeConnections,
        GraphTool::CountAssetsByCategory,
        GraphTool::ContainerContentsCountByName,
        GraphTool::ContainerContentsListByName,
        GraphTool::ContainerContentsCount,
        GraphTool::ContainerContentsList,
        GraphTool::CountAssetsBreakdown,
        GraphTool::GetSchema,
        GraphTool::ReadCypher,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GraphTool::GetNodeByName => "get_node_by_name",
            GraphTool::CountNodesByName => "count_nodes_by_name",
            GraphTool::CountByLabel => "count_by_label",
            GraphTool::GetSchema => "get_schema",
            GraphTool::ListCategories => "list_categories",
            GraphTool::DescribeNodeConnections => "describe_node_connections",
            GraphTool::ContainerContentsCountByName => "container_contents_count_by_name",
            GraphTool::ContainerContentsListByName => "container_contents_list_by_name",
            GraphTool::ContainerContentsCount => "container_contents_count",
            GraphTool::ContainerContentsList => "container_contents_list",
            GraphTool::CountAssetsBreakdown => "count_assets_breakdown",
            GraphTool::CountAssetsByCategory => "count_assets_by_category",
            GraphTool::ReadCypher => "read_cypher",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn category(self) -> ToolCategory {
        match self {
            GraphTool::GetNodeByName
            | GraphTool::CountNodesByName
            | GraphTool::CountByLabel
            | GraphTool::DescribeNodeConnections => ToolCategory::Lookup,
            GraphTool::ContainerContentsCountByName
            | GraphTool::ContainerContentsListByName
            | GraphTool::ContainerContentsCount
            | GraphTool::ContainerContentsList => ToolCategory::Contents,
            GraphTool::CountAssetsBreakdown | GraphTool::CountAssetsByCategory => {
                ToolCategory::Breakdown
            }
            GraphTool::GetSchema | GraphTool::ListCategories => ToolCategory::Schema,
            GraphTool::ReadCypher => ToolCategory::Query,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            GraphTool::GetNodeByName => {
                "Find nodes by name (case-insensitive). Searches labels in priority order \
                 (Location, Context, System, Asset, Category, then the rest). mode=\"first\" \
                 returns the first match and its node_id for container_contents_count or \
                 container_contents_list; mode=\"all\" returns every match across labels."
            }
            GraphTool::CountNodesByName => {
                "Count nodes with a given name. Use for existence questions like \
                 \"Do we have any Acidity?\". Returns the total and a per-label breakdown. \
                 name_match=\"prefix\" counts every node whose name starts with the value."
            }
            GraphTool::CountByLabel => {
                "Count all nodes carrying a label, e.g. \"Asset\" or \"Location\"."
            }
            GraphTool::GetSchema => {
                "Introspect the graph: labels, relationship types and property keys. Use when \
                 the domain tools are insufficient or before writing Cypher for read_cypher."
            }
            GraphTool::ListCategories => {
                "List all category nodes ordered by name, optionally with the BELONGS_TO \
                 hierarchy links between them."
            }
            GraphTool::DescribeNodeConnections => {
                "Show how the first node with this name is connected: its incoming and \
                 outgoing relationships with the type, name, label and fingerprint of the \
                 node on the other side."
            }
            GraphTool::ContainerContentsCountByName => {
                "Count nodes pointing INTO every container with this name, e.g. assets \
                 LOCATED_IN a hall: relationship_types=[\"LOCATED_IN\"], target_label=\"Asset\". \
                 Use name_match=\"prefix\" for generic names (\"Hall\" finds \"Hall 1\", \"Hall 2\"). \
                 Returns a per-node breakdown, the total and a summary_table to report verbatim."
            }
            GraphTool::ContainerContentsListByName => {
                "List nodes pointing INTO every container with this name. Same matching rules \
                 as container_contents_count_by_name; include_attributes limits the returned \
                 attributes."
            }
            GraphTool::ContainerContentsCount => {
                "Aggregate nodes pointing INTO the node start_node_id (from get_node_by_name). \
                 aggregation is count (default), sum, avg, min or max; the statistical forms \
                 require a numeric property_name."
            }
            GraphTool::ContainerContentsList => {
                "List nodes pointing INTO the node start_node_id (from get_node_by_name), \
                 up to limit records."
            }
            GraphTool::CountAssetsBreakdown => {
                "Asset counts for every Location, System or Context container, including \
                 empty ones. Use container_type=\"Context\" when Location returns nothing; \
                 \"Both\" covers all three. Returns a summary_table to report verbatim."
            }
            GraphTool::CountAssetsByCategory => {
                "Asset counts per category. category_scope \"location\" follows location \
                 categories, \"system\" follows system categories, \"both\" returns both."
            }
            GraphTool::ReadCypher => {
                "Execute a read-only Cypher query (MATCH, RETURN, etc.) when the domain tools \
                 cannot answer. Writes, schema changes, PROFILE and EXPLAIN are rejected. \
                 A LIMIT is appended when missing (default 1000)."
            }
        }
    }

    pub fn input_schema(self) -> Value {
        match self {
            GraphTool::GetNodeByName => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Node name" },
                    "label": { "type": "string", "description": "Restrict the lookup to one label" },
                    "name_match": name_match_schema(),
                    "mode": {
                        "type": "string",
                        "enum": ["first", "all"],
                        "description": "Return the first match or all matches (default: all)"
                    },
                    "parent_location_name": parent_scope_schema(),
                    "include_attributes": attribute_list_schema()
                },
                "required": ["name"]
            }),
            GraphTool::CountNodesByName => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Node name" },
                    "label": { "type": "string", "description": "Count only this label" },
                    "name_match": name_match_schema()
                },
                "required": ["name"]
            }),
            GraphTool::CountByLabel => json!({
                "type": "object",
                "properties": {
                    "label": { "type": "string", "description": "Node label, e.g. Asset" }
                },
                "required": ["label"]
            }),
            GraphTool::GetSchema => json!({
                "type": "object",
                "properties": {}
            }),
            GraphTool::ListCategories => json!({
                "type": "object",
                "properties": {
                    "include_hierarchy": {
                        "type": "boolean",
                        "description": "Include BELONGS_TO links between categories (default: true)"
                    }
                }
            }),
            GraphTool::DescribeNodeConnections => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Node name" },
                    "include_attributes": {
                        "type": "boolean",
                        "description": "Include the node's own attributes (default: false)"
                    }
                },
                "required": ["name"]
            }),
            GraphTool::ContainerContentsCountByName => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Container name" },
                    "relationship_types": relationship_types_schema(),
                    "target_label": target_label_schema(),
                    "label": { "type": "string", "description": "Restrict the container lookup to one label" },
                    "name_match": name_match_schema(),
                    "parent_location_name": parent_scope_schema(),
                    "validity_filter": validity_filter_schema()
                },
                "required": ["name", "relationship_types"]
            }),
            GraphTool::ContainerContentsListByName => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Container name" },
                    "relationship_types": relationship_types_schema(),
                    "target_label": target_label_schema(),
                    "label": { "type": "string", "description": "Restrict the container lookup to one label" },
                    "name_match": name_match_schema(),
                    "parent_location_name": parent_scope_schema(),
                    "validity_filter": validity_filter_schema(),
                    "limit": limit_schema(),
                    "include_attributes": attribute_list_schema()
                },
                "required": ["name", "relationship_types"]
            }),
            GraphTool::ContainerContentsCount => json!({
                "type": "object",
                "properties": {
                    "start_node_id": { "type": "string", "description": "node_id from get_node_by_name" },
                    "relationship_types": relationship_types_schema(),
                    "target_label": target_label_schema(),
                    "aggregation": {
                        "type": "string",
                        "enum": ["count", "sum", "avg", "min", "max"],
                        "description": "Aggregation over the pointing nodes (default: count)"
                    },
                    "property_name": {
                        "type": "string",
                        "description": "Numeric property for sum, avg, min and max"
                    },
                    "validity_filter": validity_filter_schema()
                },
                "required": ["start_node_id", "relationship_types"]
            }),
            GraphTool::ContainerContentsList => json!({
                "type": "object",
                "properties": {
                    "start_node_id": { "type": "string", "description": "node_id from get_node_by_name" },
                    "relationship_types": relationship_types_schema(),
                    "target_label": target_label_schema(),
                    "validity_filter": validity_filter_schema(),
                    "limit": limit_schema(),
                    "include_attributes": attribute_list_schema()
                },
                "required": ["start_node_id", "relationship_types"]
            }),
            GraphTool::CountAssetsBreakdown => json!({
                "type": "object",
                "properties": {
                    "container_type": {
                        "type": "string",
                        "enum": ["Location", "System", "Context", "Both"],
                        "description": "Containment dimension (default: Both)"
                    },
                    "validity_filter": validity_filter_schema()
                }
            }),
            GraphTool::CountAssetsByCategory => json!({
                "type": "object",
                "properties": {
                    "category_scope": {
                        "type": "string",
                        "enum": ["location", "system", "both"],
                        "description": "Which category family to count (default: both)"
                    },
                    "validity_filter": validity_filter_schema()
                }
            }),
            GraphTool::ReadCypher => json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Read-only Cypher query" },
                    "limit": {
                        "type": "integer",
                        "description": "Row cap appended when the query has no LIMIT (default: 1000)"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition::new(self.name(), self.description(), self.input_schema())
    }
}

/// Definitions for every built-in tool, in catalogue order.
pub fn graph_tool_definitions() -> Vec<ToolDefinition> {
    GraphTool::ALL.iter().map(|tool| tool.definition()).collect()
}

fn name_match_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["exact", "prefix"],
        "description": "exact = full name match; prefix = names starting with the value (default: exact)"
    })
}

fn parent_scope_schema() -> Value {
    json!({
        "type": "string",
        "description": "Only consider containers transitively under this parent location"
    })
}

fn relationship_types_schema() -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": "Relationship types pointing into the container, e.g. [\"LOCATED_IN\"]"
    })
}

fn target_label_schema() -> Value {
    json!({
        "type": "string",
        "description": "Only count pointing nodes with this label, e.g. Asset"
    })
}

fn attribute_list_schema() -> Value {
    json!({
        "type": "array",
        "items": { "type": "string" },
        "description": "Attribute keys to return"
    })
}

fn limit_schema() -> Value {
    json!({
        "type": "integer",
        "description": "Maximum records per container (default: 1000)"
    })
}

fn validity_filter_schema() -> Value {
    json!({
        "type": "object",
        "description": "Relationship validity: {\"current_only\": true} (default) or {\"as_of_date\": \"2024-01-01\"}",
        "properties": {
            "current_only": { "type": "boolean" },
            "as_of_date": { "type": "string" }
        }
    })
}
