//! Aggregation request and result types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::graph::MatchMode;
use super::validity::{ValidityFilter, ValiditySpec};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationKind {
    #[default]
    Count,
    List,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregationKind {
    pub const ALL: [AggregationKind; 6] = [
        AggregationKind::Count,
        AggregationKind::List,
        AggregationKind::Sum,
        AggregationKind::Avg,
        AggregationKind::Min,
        AggregationKind::Max,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AggregationKind::Count => "count",
            AggregationKind::List => "list",
            AggregationKind::Sum => "sum",
            AggregationKind::Avg => "avg",
            AggregationKind::Min => "min",
            AggregationKind::Max => "max",
        }
    }

    pub fn statistic(self) -> Option<StatFunction> {
        match self {
            AggregationKind::Sum => Some(StatFunction::Sum),
            AggregationKind::Avg => Some(StatFunction::Avg),
            AggregationKind::Min => Some(StatFunction::Min),
            AggregationKind::Max => Some(StatFunction::Max),
            AggregationKind::Count | AggregationKind::List => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatFunction {
    Sum,
    Avg,
    Min,
    Max,
}

impl StatFunction {
    pub fn cypher_name(self) -> &'static str {
        match self {
            StatFunction::Sum => "sum",
            StatFunction::Avg => "avg",
            StatFunction::Min => "min",
            StatFunction::Max => "max",
        }
    }

    pub fn apply(self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return match self {
                StatFunction::Sum => Some(0.0),
                _ => None,
            };
        }
        let sum: f64 = values.iter().sum();
        match self {
            StatFunction::Sum => Some(sum),
            StatFunction::Avg => Some(sum / values.len() as f64),
            StatFunction::Min => values.iter().copied().reduce(f64::min),
            StatFunction::Max => values.iter().copied().reduce(f64::max),
        }
    }
}

/// The incoming-edge aggregation applied at each container node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingAggregation {
    pub relationship_types: Vec<String>,
    #[serde(default)]
    pub target_label: Option<String>,
    #[serde(default)]
    pub kind: AggregationKind,
    /// Numeric property for sum/avg/min/max
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub validity: ValiditySpec,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Attribute subset returned for list results
    #[serde(default)]
    pub include_attributes: Option<Vec<String>>,
}

fn default_limit() -> usize {
    1000
}

impl IncomingAggregation {
    pub fn count(relationship_types: Vec<String>) -> Self {
        Self {
            relationship_types,
            target_label: None,
            kind: AggregationKind::Count,
            property_name: None,
            validity: ValiditySpec::default(),
            limit: default_limit(),
            include_attributes: None,
        }
    }

    pub fn with_kind(mut self, kind: AggregationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_target_label(mut self, target_label: impl Into<String>) -> Self {
        self.target_label = Some(target_label.into());
        self
    }

    pub fn with_property(mut self, property_name: impl Into<String>) -> Self {
        self.property_name = Some(property_name.into());
        self
    }

    pub fn with_validity(mut self, validity: ValiditySpec) -> Self {
        self.validity = validity;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

/// A name-resolved aggregation across every matching container.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationRequest {
    pub name: String,
    /// Restrict name resolution to a single label
    pub label: Option<String>,
    pub match_mode: MatchMode,
    pub parent_scope: Option<String>,
    pub aggregation: IncomingAggregation,
}

impl AggregationRequest {
    pub fn new(name: impl Into<String>, aggregation: IncomingAggregation) -> Self {
        Self {
            name: name.into(),
            label: None,
            match_mode: MatchMode::Exact,
            parent_scope: None,
            aggregation,
        }
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_parent_scope(mut self, parent_scope: impl Into<String>) -> Self {
        self.parent_scope = Some(parent_scope.into());
        self
    }
}

/// What the store computes over the incoming edges of one node.
#[derive(Debug, Clone, PartialEq)]
pub enum IncomingMeasure {
    Count,
    List {
        limit: usize,
        attributes: Option<Vec<String>>,
    },
    Statistic {
        function: StatFunction,
        property: String,
    },
}

/// Store-level form of an incoming aggregation with identifiers already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingSpec {
    pub relationship_types: Vec<String>,
    pub target_label: Option<String>,
    pub validity: ValidityFilter,
    pub measure: IncomingMeasure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IncomingOutcome {
    /// Matched target rows and edge rows
    Count { targets: u64, relationships: u64 },
    Rows(Vec<Map<String, Value>>),
    /// `None` when no target carries the property
    Statistic {
        value: Option<f64>,
        relationships: u64,
    },
}

/// Per-node result value: a count, a list of records or a statistic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregateValue {
    Count(u64),
    Rows(Vec<Map<String, Value>>),
    Statistic(Option<f64>),
}

impl AggregateValue {
    /// The numeric contribution of this value to a total.
    pub fn measure(&self) -> f64 {
        match self {
            AggregateValue::Count(n) => *n as f64,
            AggregateValue::Rows(rows) => rows.len() as f64,
            AggregateValue::Statistic(v) => v.unwrap_or(0.0),
        }
    }

    pub fn display(&self) -> String {
        match self {
            AggregateValue::Count(n) => n.to_string(),
            AggregateValue::Rows(rows) => rows.len().to_string(),
            AggregateValue::Statistic(Some(v)) => format_number(*v),
            AggregateValue::Statistic(None) => "n/a".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TotalValue {
    Count(u64),
    Statistic(Option<f64>),
}

impl TotalValue {
    pub fn display(&self) -> String {
        match self {
            TotalValue::Count(n) => n.to_string(),
            TotalValue::Statistic(Some(v)) => format_number(*v),
            TotalValue::Statistic(None) => "n/a".to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TotalValue::Count(n) => Some(*n as f64),
            TotalValue::Statistic(v) => *v,
        }
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAggregate {
    pub node_id: String,
    pub label: String,
    pub fingerprint: Option<String>,
    pub attributes: Map<String, Value>,
    pub result: AggregateValue,
    pub relationship_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationResult {
    pub name: String,
    pub found: bool,
    pub aggregation: AggregationKind,
    pub nodes_count: usize,
    pub per_node: Vec<NodeAggregate>,
    /// Combined result over every matched node. Count and sum equal the sum of
    /// `per_node` results and list totals the listed items. Avg is weighted by
    /// relationship count and min/max take the extreme, so neither sums.
    pub total_result: TotalValue,
    pub total_relationship_count: u64,
    pub total_count: u64,
    pub summary_table: String,
}
