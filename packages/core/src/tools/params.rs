//! Typed parameters for each graph tool.
//!
//! Field names are the wire names the catalogue declares. Defaults match the
//! catalogue descriptions.

use serde::Deserialize;

use crate::models::{
    AggregationKind, BreakdownDimension, CategoryScope, MatchMode, ResolveMode, ValiditySpec,
};

fn default_limit() -> usize {
    1000
}

fn default_true() -> bool {
    true
}

fn default_breakdown() -> BreakdownDimension {
    BreakdownDimension::Both
}

fn default_category_scope() -> CategoryScope {
    CategoryScope::Both
}

#[derive(Debug, Deserialize)]
pub struct GetNodeByNameParams {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name_match: MatchMode,
    #[serde(default)]
    pub mode: ResolveMode,
    #[serde(default)]
    pub parent_location_name: Option<String>,
    #[serde(default)]
    pub include_attributes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CountNodesByNameParams {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name_match: MatchMode,
}

#[derive(Debug, Deserialize)]
pub struct CountByLabelParams {
    pub label: String,
}

#[derive(Debug, Deserialize)]
pub struct ListCategoriesParams {
    #[serde(default = "default_true")]
    pub include_hierarchy: bool,
}

#[derive(Debug, Deserialize)]
pub struct DescribeConnectionsParams {
    pub name: String,
    #[serde(default)]
    pub include_attributes: bool,
}

/// Parameters shared by the by-name contents tools.
#[derive(Debug, Deserialize)]
pub struct ContentsByNameParams {
    pub name: String,
    pub relationship_types: Vec<String>,
    #[serde(default)]
    pub target_label: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub name_match: MatchMode,
    #[serde(default)]
    pub parent_location_name: Option<String>,
    #[serde(default)]
    pub validity_filter: Option<ValiditySpec>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub include_attributes: Option<Vec<String>>,
}

/// Parameters shared by the node-id contents tools.
#[derive(Debug, Deserialize)]
pub struct ContentsByIdParams {
    pub start_node_id: String,
    pub relationship_types: Vec<String>,
    #[serde(default)]
    pub target_label: Option<String>,
    #[serde(default)]
    pub aggregation: AggregationKind,
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub validity_filter: Option<ValiditySpec>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub include_attributes: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct BreakdownParams {
    #[serde(default = "default_breakdown")]
    pub container_type: BreakdownDimension,
    #[serde(default)]
    pub validity_filter: Option<ValiditySpec>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryCountParams {
    #[serde(default = "default_category_scope")]
    pub category_scope: CategoryScope,
    #[serde(default)]
    pub validity_filter: Option<ValiditySpec>,
}

#[derive(Debug, Deserialize)]
pub struct ReadCypherParams {
    pub query: String,
    #[serde(default)]
    pub limit: Option<usize>,
}
