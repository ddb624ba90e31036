//! Graph node and relationship records as seen by the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A node converted to a plain record.
///
/// `attributes` holds every property of the node, including `name` and the
/// optional `fingerprint` display key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: String,
    pub labels: Vec<String>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl NodeRecord {
    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.attributes.get("fingerprint").and_then(Value::as_str)
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Attributes restricted to `keys`, or all attributes when `keys` is `None`.
    pub fn projected(&self, keys: Option<&[String]>) -> Map<String, Value> {
        match keys {
            Some(keys) if !keys.is_empty() => keys
                .iter()
                .filter_map(|k| self.attributes.get(k).map(|v| (k.clone(), v.clone())))
                .collect(),
            _ => self.attributes.clone(),
        }
    }
}

/// A node returned by name resolution, tagged with the label it matched under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedNode {
    pub node_id: String,
    pub label: String,
    pub attributes: Map<String, Value>,
}

impl ResolvedNode {
    pub fn from_record(record: NodeRecord, label: impl Into<String>) -> Self {
        Self {
            node_id: record.node_id,
            label: label.into(),
            attributes: record.attributes,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.attributes.get("name").and_then(Value::as_str)
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.attributes.get("fingerprint").and_then(Value::as_str)
    }
}

/// How a queried name is compared against `name` on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Case-insensitive full equality
    #[default]
    Exact,
    /// Case-insensitive "starts with", not word-boundary aware
    Prefix,
}

impl MatchMode {
    pub fn matches(self, candidate: &str, query: &str) -> bool {
        let candidate = candidate.to_lowercase();
        let query = query.to_lowercase();
        match self {
            MatchMode::Exact => candidate == query,
            MatchMode::Prefix => candidate.starts_with(&query),
        }
    }
}

/// How many nodes name resolution returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveMode {
    /// First match across the ordered labels
    First,
    /// Union of matches across all labels, deduplicated by node id
    #[default]
    All,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResolveRequest {
    pub name: String,
    /// Restrict the lookup to a single label
    pub label: Option<String>,
    pub match_mode: MatchMode,
    pub mode: ResolveMode,
    /// Name of an ancestor container the match must sit under
    pub parent_scope: Option<String>,
}

impl ResolveRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn with_match_mode(mut self, match_mode: MatchMode) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn with_mode(mut self, mode: ResolveMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_parent_scope(mut self, parent_scope: Option<String>) -> Self {
        self.parent_scope = parent_scope;
        self
    }
}

/// Restricts name matches to nodes sitting under a named ancestor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentScope {
    pub name: String,
    /// Labels the ancestor may carry
    pub ancestor_labels: Vec<String>,
    /// Relationship walked (transitively, outgoing) from the node to the ancestor
    pub relationship_type: String,
}

/// Item and member counts for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category_name: String,
    pub category_fingerprint: Option<String>,
    pub item_count: u64,
    pub member_count: u64,
}

/// Item count for one container in a breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerCount {
    pub node_id: String,
    pub name: Option<String>,
    pub fingerprint: Option<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub node_id: String,
    pub name: Option<String>,
    pub fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryLink {
    pub from: String,
    pub to: String,
    pub relationship_type: String,
}

impl CategoryLink {
    pub fn describe(&self) -> String {
        format!("{} --{}--> {}", self.from, self.relationship_type, self.to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionDirection {
    Incoming,
    Outgoing,
}

/// One relationship seen from an anchor node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub direction: ConnectionDirection,
    pub relationship_type: String,
    pub other_node_id: String,
    pub other_name: Option<String>,
    pub other_label: Option<String>,
    pub other_fingerprint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeConnections {
    pub incoming: Vec<Connection>,
    pub outgoing: Vec<Connection>,
}
