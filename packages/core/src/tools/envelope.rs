//! Uniform tool result envelope.
//!
//! Every tool call produces a [`ToolOutcome`] that serializes as
//! `{"ok": true, "value": ...}` or `{"ok": false, "error": "..."}`. Whether a
//! successful call actually answered something is a property of the payload
//! variant ([`ToolPayload::is_success`]), which drives the orchestrator's
//! decision to ask for a final summary.

use serde::Serialize;
use serde_json::Value;

use crate::models::{AggregateValue, AggregationResult};
use crate::services::{
    BreakdownResult, CategoryCountsResult, CategoryListing, ConnectionsResult, LabelCount,
    NameCount, NodeAggregateResult, NodeLookup, RawQueryResult, SchemaSummary,
};

/// Closed set of tool result shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolPayload {
    Lookup(NodeLookup),
    NameCount(NameCount),
    LabelCount(LabelCount),
    Aggregation(AggregationResult),
    NodeAggregate(NodeAggregateResult),
    Breakdown(BreakdownResult),
    CategoryCounts(CategoryCountsResult),
    Categories(CategoryListing),
    Connections(ConnectionsResult),
    Schema(SchemaSummary),
    RawRows(RawQueryResult),
    /// Collaborator result, opaque to the core
    External(Value),
}

impl ToolPayload {
    /// Whether the payload answers something.
    pub fn is_success(&self) -> bool {
        match self {
            ToolPayload::Lookup(lookup) => lookup.found,
            ToolPayload::NameCount(count) => count.found,
            ToolPayload::LabelCount(count) => count.total_count > 0,
            ToolPayload::Aggregation(result) => result.found,
            ToolPayload::NodeAggregate(result) => match &result.result {
                AggregateValue::Count(n) => *n > 0,
                AggregateValue::Rows(rows) => !rows.is_empty(),
                AggregateValue::Statistic(value) => value.is_some(),
            },
            ToolPayload::Breakdown(result) => {
                result.total_count > 0
                    || result.breakdown.iter().any(|d| !d.per_container.is_empty())
            }
            ToolPayload::CategoryCounts(result) => {
                result.scopes.iter().any(|s| !s.categories.is_empty())
            }
            ToolPayload::Categories(listing) => listing.category_count > 0,
            ToolPayload::Connections(connections) => connections.found,
            ToolPayload::Schema(schema) => {
                !schema.labels.is_empty() || !schema.relationship_types.is_empty()
            }
            // A read query that ran is an answer even when it matched nothing
            ToolPayload::RawRows(_) => true,
            ToolPayload::External(value) => probe_success(value),
        }
    }
}

/// Success probe for opaque collaborator results.
fn probe_success(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return match value {
            Value::Array(items) => !items.is_empty(),
            Value::Number(n) => n.as_f64().is_some_and(|f| f > 0.0),
            _ => false,
        };
    };
    if map.contains_key("error") {
        return false;
    }
    let positive = |key: &str| map.get(key).and_then(Value::as_f64).is_some_and(|f| f > 0.0);
    let non_empty = |key: &str| {
        map.get(key)
            .and_then(Value::as_array)
            .is_some_and(|items| !items.is_empty())
    };
    map.get("found") == Some(&Value::Bool(true))
        || positive("total_count")
        || positive("total_result")
        || non_empty("per_node")
        || non_empty("categories")
        || map
            .get("summary")
            .and_then(Value::as_str)
            .is_some_and(|s| !s.is_empty())
        || map.contains_key("result")
}

/// Result of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutcome {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<ToolPayload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ToolOutcome {
    pub fn success(payload: ToolPayload) -> Self {
        Self {
            ok: true,
            value: Some(payload),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            value: None,
            error: Some(error.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ok
    }

    pub fn payload(&self) -> Option<&ToolPayload> {
        self.value.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Ok and the payload answers something.
    pub fn is_success(&self) -> bool {
        self.value.as_ref().is_some_and(ToolPayload::is_success)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self)
            .unwrap_or_else(|e| serde_json::json!({"ok": false, "error": e.to_string()}))
    }
}
