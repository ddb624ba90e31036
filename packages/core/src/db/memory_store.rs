//! In-process [`GraphStore`] backend.
//!
//! `MemoryGraph` evaluates the store primitives directly over nodes and
//! relationships held in memory. It backs the test suites, the benches and the
//! server's demo mode. Raw read queries cannot be evaluated here; the store
//! records each one it receives and answers with preset rows.

use std::collections::{HashSet, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::{GraphError, GraphStore};
use crate::models::{
    CategoryCount, CategoryLink, CategoryNode, CategoryRule, Connection, ConnectionDirection,
    ContainerCount, ContainmentRule, IncomingMeasure, IncomingOutcome, IncomingSpec, MatchMode,
    NodeConnections, NodeRecord, ParentScope, SchemaSnapshot, ValidityFilter,
};

/// A stored relationship. `from` points at `to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRelationship {
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl MemoryRelationship {
    fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    fn admitted_by(&self, validity: ValidityFilter) -> bool {
        validity.admits(self.property("validity_from"), self.property("validity_to"))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct FixtureNode {
    id: String,
    labels: Vec<String>,
    #[serde(default)]
    properties: Map<String, Value>,
}

/// On-disk fixture layout.
#[derive(Debug, Clone, Deserialize)]
struct Fixture {
    nodes: Vec<FixtureNode>,
    #[serde(default)]
    relationships: Vec<MemoryRelationship>,
}

#[derive(Debug, Default)]
struct GraphData {
    nodes: Vec<NodeRecord>,
    relationships: Vec<MemoryRelationship>,
}

impl GraphData {
    fn node(&self, node_id: &str) -> Option<&NodeRecord> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    /// Whether `node_id` reaches a matching ancestor over outgoing scope edges.
    fn under_scope(&self, node_id: &str, scope: &ParentScope) -> bool {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([node_id]);
        while let Some(current) = queue.pop_front() {
            for rel in self
                .relationships
                .iter()
                .filter(|r| r.from == current && r.rel_type == scope.relationship_type)
            {
                if !seen.insert(rel.to.as_str()) {
                    continue;
                }
                if let Some(parent) = self.node(&rel.to) {
                    let label_ok = scope.ancestor_labels.is_empty()
                        || scope.ancestor_labels.iter().any(|l| parent.has_label(l));
                    let name_ok = parent
                        .name()
                        .is_some_and(|n| MatchMode::Exact.matches(n, &scope.name));
                    if label_ok && name_ok {
                        return true;
                    }
                }
                queue.push_back(rel.to.as_str());
            }
        }
        false
    }

    fn name_matches(node: &NodeRecord, name: &str, match_mode: MatchMode) -> bool {
        node.name().is_some_and(|n| match_mode.matches(n, name))
    }
}

/// Ascending with missing values last, as Cypher orders nulls.
fn nulls_last(value: Option<&str>) -> (bool, String) {
    (value.is_none(), value.unwrap_or_default().to_string())
}

pub struct MemoryGraph {
    data: RwLock<GraphData>,
    next_id: AtomicU64,
    raw_rows: RwLock<Vec<Map<String, Value>>>,
    raw_queries: RwLock<Vec<String>>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(GraphData::default()),
            next_id: AtomicU64::new(1),
            raw_rows: RwLock::new(Vec::new()),
            raw_queries: RwLock::new(Vec::new()),
        }
    }

    /// Build a graph from a JSON fixture value.
    pub async fn from_json(value: Value) -> Result<Self, GraphError> {
        let fixture: Fixture = serde_json::from_value(value).map_err(GraphError::fixture)?;
        let graph = Self::new();
        {
            let mut data = graph.data.write().await;
            for node in fixture.nodes {
                data.nodes.push(NodeRecord {
                    node_id: node.id,
                    labels: node.labels,
                    attributes: node.properties,
                });
            }
            for rel in fixture.relationships {
                if data.node(&rel.from).is_none() || data.node(&rel.to).is_none() {
                    return Err(GraphError::fixture(format!(
                        "relationship {} references an unknown node ({} -> {})",
                        rel.rel_type, rel.from, rel.to
                    )));
                }
                data.relationships.push(rel);
            }
        }
        Ok(graph)
    }

    /// Build a graph from a JSON fixture file.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, GraphError> {
        let text = tokio::fs::read_to_string(path.as_ref())
            .await
            .map_err(GraphError::fixture)?;
        let value: Value = serde_json::from_str(&text).map_err(GraphError::fixture)?;
        Self::from_json(value).await
    }

    /// Add a node and return its generated id.
    pub async fn add_node(&self, labels: &[&str], attributes: Value) -> String {
        let node_id = format!("mem:{}", self.next_id.fetch_add(1, Ordering::Relaxed));
        let attributes = match attributes {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.data.write().await.nodes.push(NodeRecord {
            node_id: node_id.clone(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            attributes,
        });
        node_id
    }

    /// Add a relationship pointing from `from` to `to`.
    pub async fn relate(&self, from: &str, rel_type: &str, to: &str, properties: Value) {
        let properties = match properties {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        self.data.write().await.relationships.push(MemoryRelationship {
            from: from.to_string(),
            to: to.to_string(),
            rel_type: rel_type.to_string(),
            properties,
        });
    }

    /// Rows every raw read query answers with.
    pub async fn set_raw_rows(&self, rows: Vec<Map<String, Value>>) {
        *self.raw_rows.write().await = rows;
    }

    /// Raw queries received so far, in order.
    pub async fn raw_queries(&self) -> Vec<String> {
        self.raw_queries.read().await.clone()
    }

    pub async fn node_count(&self) -> usize {
        self.data.read().await.nodes.len()
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    async fn schema(&self) -> Result<SchemaSnapshot, GraphError> {
        let data = self.data.read().await;
        let mut labels: Vec<String> = data.nodes.iter().flat_map(|n| n.labels.clone()).collect();
        labels.sort();
        labels.dedup();
        let mut relationship_types: Vec<String> =
            data.relationships.iter().map(|r| r.rel_type.clone()).collect();
        relationship_types.sort();
        relationship_types.dedup();
        let mut property_keys: Vec<String> = data
            .nodes
            .iter()
            .flat_map(|n| n.attributes.keys().cloned())
            .chain(
                data.relationships
                    .iter()
                    .flat_map(|r| r.properties.keys().cloned()),
            )
            .collect();
        property_keys.sort();
        property_keys.dedup();
        Ok(SchemaSnapshot {
            labels,
            relationship_types,
            property_keys,
        })
    }

    async fn find_by_name(
        &self,
        label: &str,
        name: &str,
        match_mode: MatchMode,
        scope: Option<&ParentScope>,
        limit: Option<usize>,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        let data = self.data.read().await;
        let matches = data
            .nodes
            .iter()
            .filter(|n| n.has_label(label) && GraphData::name_matches(n, name, match_mode))
            .filter(|n| scope.map_or(true, |s| data.under_scope(&n.node_id, s)))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matches)
    }

    async fn count_by_name(
        &self,
        label: &str,
        name: &str,
        match_mode: MatchMode,
    ) -> Result<u64, GraphError> {
        let data = self.data.read().await;
        Ok(data
            .nodes
            .iter()
            .filter(|n| n.has_label(label) && GraphData::name_matches(n, name, match_mode))
            .count() as u64)
    }

    async fn count_by_label(&self, label: &str) -> Result<u64, GraphError> {
        let data = self.data.read().await;
        Ok(data.nodes.iter().filter(|n| n.has_label(label)).count() as u64)
    }

    async fn aggregate_incoming(
        &self,
        node_id: &str,
        spec: &IncomingSpec,
    ) -> Result<IncomingOutcome, GraphError> {
        let data = self.data.read().await;
        let matched: Vec<&NodeRecord> = data
            .relationships
            .iter()
            .filter(|r| r.to == node_id && spec.relationship_types.contains(&r.rel_type))
            .filter(|r| r.admitted_by(spec.validity))
            .filter_map(|r| data.node(&r.from))
            .filter(|source| {
                spec.target_label
                    .as_deref()
                    .map_or(true, |label| source.has_label(label))
            })
            .collect();

        Ok(match &spec.measure {
            IncomingMeasure::Count => IncomingOutcome::Count {
                targets: matched.len() as u64,
                relationships: matched.len() as u64,
            },
            IncomingMeasure::List { limit, attributes } => IncomingOutcome::Rows(
                matched
                    .iter()
                    .take(*limit)
                    .map(|node| {
                        let mut row = node.projected(attributes.as_deref());
                        row.insert("node_id".to_string(), Value::String(node.node_id.clone()));
                        row
                    })
                    .collect(),
            ),
            IncomingMeasure::Statistic { function, property } => {
                let values: Vec<f64> = matched
                    .iter()
                    .filter_map(|node| node.attributes.get(property).and_then(Value::as_f64))
                    .collect();
                IncomingOutcome::Statistic {
                    value: function.apply(&values),
                    relationships: values.len() as u64,
                }
            }
        })
    }

    async fn container_counts(
        &self,
        rule: &ContainmentRule,
        item_label: &str,
        validity: ValidityFilter,
    ) -> Result<Vec<ContainerCount>, GraphError> {
        let data = self.data.read().await;
        let mut counts: Vec<ContainerCount> = data
            .nodes
            .iter()
            .filter(|n| n.has_label(&rule.container_label))
            .map(|container| {
                let count = data
                    .relationships
                    .iter()
                    .filter(|r| r.to == container.node_id && r.rel_type == rule.relationship_type)
                    .filter(|r| r.admitted_by(validity))
                    .filter(|r| data.node(&r.from).is_some_and(|a| a.has_label(item_label)))
                    .count() as u64;
                ContainerCount {
                    node_id: container.node_id.clone(),
                    name: container.name().map(str::to_string),
                    fingerprint: container.fingerprint().map(str::to_string),
                    count,
                }
            })
            .collect();
        counts.sort_by_key(|c| nulls_last(c.fingerprint.as_deref()));
        Ok(counts)
    }

    async fn category_names(
        &self,
        rule: &CategoryRule,
        category_label: &str,
    ) -> Result<Vec<String>, GraphError> {
        let data = self.data.read().await;
        let mut names: Vec<String> = data
            .relationships
            .iter()
            .filter(|r| r.rel_type == rule.membership_relationship)
            .filter(|r| data.node(&r.from).is_some_and(|m| m.has_label(&rule.member_label)))
            .filter_map(|r| data.node(&r.to))
            .filter(|cat| cat.has_label(category_label))
            .filter_map(|cat| cat.name().map(str::to_string))
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    async fn category_counts(
        &self,
        rule: &CategoryRule,
        category_label: &str,
        item_label: &str,
        category_names: &[String],
        validity: ValidityFilter,
    ) -> Result<Vec<CategoryCount>, GraphError> {
        let data = self.data.read().await;
        let mut counts: Vec<CategoryCount> = data
            .nodes
            .iter()
            .filter(|cat| cat.has_label(category_label))
            .filter(|cat| cat.name().is_some_and(|n| category_names.iter().any(|c| c == n)))
            .map(|cat| {
                let members: HashSet<&str> = data
                    .relationships
                    .iter()
                    .filter(|r| r.to == cat.node_id && r.rel_type == rule.membership_relationship)
                    .filter(|r| data.node(&r.from).is_some_and(|m| m.has_label(&rule.member_label)))
                    .map(|r| r.from.as_str())
                    .collect();
                let items: HashSet<&str> = data
                    .relationships
                    .iter()
                    .filter(|r| {
                        r.rel_type == rule.containment_relationship
                            && members.contains(r.to.as_str())
                    })
                    .filter(|r| r.admitted_by(validity))
                    .filter(|r| data.node(&r.from).is_some_and(|a| a.has_label(item_label)))
                    .map(|r| r.from.as_str())
                    .collect();
                CategoryCount {
                    category_name: cat.name().unwrap_or_default().to_string(),
                    category_fingerprint: cat.fingerprint().map(str::to_string),
                    item_count: items.len() as u64,
                    member_count: members.len() as u64,
                }
            })
            .collect();
        counts.sort_by(|a, b| a.category_name.cmp(&b.category_name));
        Ok(counts)
    }

    async fn categories(&self, category_label: &str) -> Result<Vec<CategoryNode>, GraphError> {
        let data = self.data.read().await;
        let mut categories: Vec<CategoryNode> = data
            .nodes
            .iter()
            .filter(|n| n.has_label(category_label))
            .map(|n| CategoryNode {
                node_id: n.node_id.clone(),
                name: n.name().map(str::to_string),
                fingerprint: n.fingerprint().map(str::to_string),
            })
            .collect();
        categories.sort_by_key(|c| nulls_last(c.name.as_deref()));
        Ok(categories)
    }

    async fn category_links(
        &self,
        category_label: &str,
        relationship_type: &str,
    ) -> Result<Vec<CategoryLink>, GraphError> {
        let data = self.data.read().await;
        let mut links: Vec<CategoryLink> = data
            .relationships
            .iter()
            .filter(|r| r.rel_type == relationship_type)
            .filter_map(|r| Some((data.node(&r.from)?, data.node(&r.to)?)))
            .filter(|(from, to)| from.has_label(category_label) && to.has_label(category_label))
            .map(|(from, to)| CategoryLink {
                from: from.name().unwrap_or_default().to_string(),
                to: to.name().unwrap_or_default().to_string(),
                relationship_type: relationship_type.to_string(),
            })
            .collect();
        links.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
        Ok(links)
    }

    async fn node_connections(&self, node_id: &str) -> Result<NodeConnections, GraphError> {
        let data = self.data.read().await;
        let connection = |rel: &MemoryRelationship, direction: ConnectionDirection| {
            let other_id = match direction {
                ConnectionDirection::Outgoing => &rel.to,
                ConnectionDirection::Incoming => &rel.from,
            };
            let other = data.node(other_id);
            Connection {
                direction,
                relationship_type: rel.rel_type.clone(),
                other_node_id: other_id.clone(),
                other_name: other.and_then(|o| o.name()).map(str::to_string),
                other_label: other.and_then(|o| o.labels.first().cloned()),
                other_fingerprint: other.and_then(|o| o.fingerprint()).map(str::to_string),
            }
        };
        let sort = |list: &mut Vec<Connection>| {
            list.sort_by(|a, b| {
                (&a.relationship_type, nulls_last(a.other_name.as_deref()))
                    .cmp(&(&b.relationship_type, nulls_last(b.other_name.as_deref())))
            })
        };

        let mut outgoing: Vec<Connection> = data
            .relationships
            .iter()
            .filter(|r| r.from == node_id)
            .map(|r| connection(r, ConnectionDirection::Outgoing))
            .collect();
        let mut incoming: Vec<Connection> = data
            .relationships
            .iter()
            .filter(|r| r.to == node_id)
            .map(|r| connection(r, ConnectionDirection::Incoming))
            .collect();
        sort(&mut outgoing);
        sort(&mut incoming);
        Ok(NodeConnections { incoming, outgoing })
    }

    async fn run_read_query(&self, query: &str) -> Result<Vec<Map<String, Value>>, GraphError> {
        self.raw_queries.write().await.push(query.to_string());
        Ok(self.raw_rows.read().await.clone())
    }
}
