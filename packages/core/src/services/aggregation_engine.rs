//! Graph Aggregation Engine
//!
//! Single source of truth for every count, list and statistical question the
//! agent can ask of the graph.
//!
//! # Architecture
//!
//! - **Resolution**: names are matched label by label in priority order, in
//!   `first` mode (one anchor node) or `all` mode (every match, deduplicated
//!   by node id so multi-label nodes are counted once)
//! - **Aggregation**: for each resolved container the store aggregates the
//!   incoming edges; containment edges always point from item to container
//! - **Totals**: per-node results are folded into a total and rendered as a
//!   breakdown table with a trailing total row
//! - **Validation**: unknown labels, empty relationship type sets and missing
//!   property names are rejected before any query runs
//!
//! The engine holds no per-request state. It shares the store's pooled
//! connection and the process-wide [`SchemaCache`] with every other request.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::error::EngineError;
use super::read_guard::prepare_read_query;
use super::schema_cache::SchemaCache;
use super::summary_table::{breakdown_table, rows_from_aggregates};
use crate::config::DEFAULT_RAW_QUERY_LIMIT;
use crate::db::{cypher, GraphStore};
use crate::models::{
    AggregateValue, AggregationKind, AggregationRequest, AggregationResult, GraphVocabulary,
    IncomingAggregation, IncomingMeasure, IncomingOutcome, IncomingSpec, MatchMode,
    NodeAggregate, ParentScope, ResolveMode, ResolveRequest, ResolvedNode, SchemaSnapshot,
    TotalValue, ValidityFilter,
};

/// Result of a name lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLookup {
    pub name: String,
    pub found: bool,
    pub count: usize,
    pub nodes: Vec<ResolvedNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTally {
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NameCount {
    pub name: String,
    pub found: bool,
    pub total_count: u64,
    pub by_label: Vec<LabelTally>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelCount {
    pub label: String,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSummary {
    pub labels: Vec<String>,
    pub relationship_types: Vec<String>,
    pub property_keys: Vec<String>,
    pub summary: String,
}

impl From<SchemaSnapshot> for SchemaSummary {
    fn from(snapshot: SchemaSnapshot) -> Self {
        let summary = snapshot.summary();
        Self {
            labels: snapshot.labels,
            relationship_types: snapshot.relationship_types,
            property_keys: snapshot.property_keys,
            summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawQueryResult {
    pub query: String,
    pub result: Vec<Map<String, Value>>,
    pub count: usize,
}

/// Aggregation at a single node addressed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAggregateResult {
    pub node_id: String,
    pub aggregation: AggregationKind,
    pub result: AggregateValue,
    pub relationship_count: u64,
    pub target_nodes_found: u64,
}

pub struct GraphAggregationEngine {
    pub(super) store: Arc<dyn GraphStore>,
    pub(super) cache: Arc<SchemaCache>,
    pub(super) vocabulary: GraphVocabulary,
    raw_query_limit: usize,
}

impl GraphAggregationEngine {
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        let cache = Arc::new(SchemaCache::new(store.clone()));
        Self {
            store,
            cache,
            vocabulary: GraphVocabulary::default(),
            raw_query_limit: DEFAULT_RAW_QUERY_LIMIT,
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: GraphVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn with_raw_query_limit(mut self, limit: usize) -> Self {
        self.raw_query_limit = limit;
        self
    }

    pub fn vocabulary(&self) -> &GraphVocabulary {
        &self.vocabulary
    }

    pub fn schema_cache(&self) -> &Arc<SchemaCache> {
        &self.cache
    }

    /// Drop every cached schema fact. Called on the graph-reset signal.
    pub fn invalidate_caches(&self) {
        self.cache.invalidate();
    }

    /// Labels present in the live graph, sorted.
    pub async fn known_labels(&self) -> Result<Vec<String>, EngineError> {
        let mut labels = self.cache.schema().await?.labels;
        if labels.is_empty() {
            labels = self.vocabulary.fallback_labels.clone();
        }
        labels.sort();
        Ok(labels)
    }

    pub(super) async fn require_label(&self, field: &str, label: &str) -> Result<(), EngineError> {
        let known = self.known_labels().await?;
        if known.iter().any(|l| l == label) {
            Ok(())
        } else {
            Err(EngineError::unknown_label(field, &known))
        }
    }

    /// Labels to search, in lookup order.
    async fn lookup_order(&self, label: Option<&str>) -> Result<Vec<String>, EngineError> {
        match label {
            Some(label) => {
                self.require_label("label", label).await?;
                Ok(vec![label.to_string()])
            }
            None => Ok(self.vocabulary.ordered_labels(&self.known_labels().await?)),
        }
    }

    /// Resolve a name to nodes.
    ///
    /// An empty result is a valid outcome, not an error.
    pub async fn resolve_by_name(
        &self,
        request: &ResolveRequest,
    ) -> Result<Vec<ResolvedNode>, EngineError> {
        let labels = self.lookup_order(request.label.as_deref()).await?;
        let scope = request
            .parent_scope
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|name| ParentScope {
                name: name.to_string(),
                ancestor_labels: self.vocabulary.container_labels.clone(),
                relationship_type: self.vocabulary.hierarchy_relationship.clone(),
            });
        let limit = match request.mode {
            ResolveMode::First => Some(1),
            ResolveMode::All => None,
        };

        let mut seen: HashSet<String> = HashSet::new();
        let mut resolved = Vec::new();
        for label in &labels {
            let label_scope = scope
                .as_ref()
                .filter(|_| self.vocabulary.is_container_label(label));
            let records = self
                .store
                .find_by_name(label, &request.name, request.match_mode, label_scope, limit)
                .await?;
            for record in records {
                if seen.insert(record.node_id.clone()) {
                    resolved.push(ResolvedNode::from_record(record, label.clone()));
                }
            }
            if request.mode == ResolveMode::First && !resolved.is_empty() {
                break;
            }
        }
        debug!(
            "Resolved '{}' ({:?}, {:?}) to {} node(s)",
            request.name,
            request.match_mode,
            request.mode,
            resolved.len()
        );
        Ok(resolved)
    }

    /// Name lookup with optional attribute projection.
    pub async fn lookup(
        &self,
        request: &ResolveRequest,
        include_attributes: Option<&[String]>,
    ) -> Result<NodeLookup, EngineError> {
        let mut nodes = self.resolve_by_name(request).await?;
        if let Some(keys) = include_attributes.filter(|k| !k.is_empty()) {
            for node in &mut nodes {
                node.attributes = keys
                    .iter()
                    .filter_map(|k| node.attributes.get(k).map(|v| (k.clone(), v.clone())))
                    .collect();
            }
        }
        Ok(NodeLookup {
            name: request.name.clone(),
            found: !nodes.is_empty(),
            count: nodes.len(),
            nodes,
        })
    }

    /// Validate an incoming aggregation and turn it into a store spec.
    pub(super) async fn incoming_spec(
        &self,
        aggregation: &IncomingAggregation,
    ) -> Result<IncomingSpec, EngineError> {
        if aggregation.relationship_types.is_empty() {
            return Err(EngineError::empty_relationship_types());
        }
        if let Some(bad) = aggregation
            .relationship_types
            .iter()
            .find(|t| !cypher::is_identifier(t))
        {
            return Err(EngineError::validation(format!(
                "invalid relationship type '{}'",
                bad
            )));
        }
        if let Some(target_label) = &aggregation.target_label {
            self.require_label("target_label", target_label).await?;
        }
        let validity = ValidityFilter::from_spec(&aggregation.validity)?;

        let measure = match aggregation.kind.statistic() {
            Some(function) => {
                let property = aggregation
                    .property_name
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| EngineError::missing_property(aggregation.kind.as_str()))?;
                if !cypher::is_identifier(property) {
                    return Err(EngineError::validation(format!(
                        "invalid property_name '{}'",
                        property
                    )));
                }
                IncomingMeasure::Statistic {
                    function,
                    property: property.to_string(),
                }
            }
            None if aggregation.kind == AggregationKind::List => IncomingMeasure::List {
                limit: aggregation.limit,
                attributes: aggregation.include_attributes.clone(),
            },
            None => IncomingMeasure::Count,
        };

        Ok(IncomingSpec {
            relationship_types: aggregation.relationship_types.clone(),
            target_label: aggregation.target_label.clone(),
            validity,
            measure,
        })
    }

    /// Aggregate incoming edges at every node the request's name resolves to.
    pub async fn aggregate(
        &self,
        request: &AggregationRequest,
    ) -> Result<AggregationResult, EngineError> {
        let aggregation = &request.aggregation;
        let spec = self.incoming_spec(aggregation).await?;
        let resolve = ResolveRequest::new(request.name.clone())
            .with_label(request.label.clone())
            .with_match_mode(request.match_mode)
            .with_mode(ResolveMode::All)
            .with_parent_scope(request.parent_scope.clone());
        let nodes = self.resolve_by_name(&resolve).await?;

        let mut per_node = Vec::with_capacity(nodes.len());
        for node in nodes {
            let outcome = self.store.aggregate_incoming(&node.node_id, &spec).await?;
            let (result, relationship_count) = split_outcome(outcome);
            per_node.push(NodeAggregate {
                fingerprint: node.fingerprint().map(str::to_string),
                node_id: node.node_id,
                label: node.label,
                attributes: node.attributes,
                result,
                relationship_count,
            });
        }

        let total_relationship_count: u64 = per_node.iter().map(|p| p.relationship_count).sum();
        let total_result = fold_total(aggregation.kind, &per_node);
        let total_count = match &total_result {
            TotalValue::Count(n) => *n,
            TotalValue::Statistic(_) => total_relationship_count,
        };

        let container_label = per_node
            .first()
            .map(|p| p.label.clone())
            .unwrap_or_else(|| "Container".to_string());
        let value_column = self.value_column(aggregation);
        let summary_table = breakdown_table(
            &container_label,
            &value_column,
            &rows_from_aggregates(&per_node),
            &total_result.display(),
        );

        info!(
            "📊 Aggregated '{}' over {} node(s): total {}",
            request.name,
            per_node.len(),
            total_result.display()
        );
        Ok(AggregationResult {
            name: request.name.clone(),
            found: !per_node.is_empty(),
            aggregation: aggregation.kind,
            nodes_count: per_node.len(),
            per_node,
            total_result,
            total_relationship_count,
            total_count,
            summary_table,
        })
    }

    /// Aggregate incoming edges at one node addressed by id.
    pub async fn aggregate_node(
        &self,
        node_id: &str,
        aggregation: &IncomingAggregation,
    ) -> Result<NodeAggregateResult, EngineError> {
        if node_id.trim().is_empty() {
            return Err(EngineError::validation("start_node_id cannot be empty"));
        }
        let spec = self.incoming_spec(aggregation).await?;
        let outcome = self.store.aggregate_incoming(node_id, &spec).await?;
        let target_nodes_found = match &outcome {
            IncomingOutcome::Count { targets, .. } => *targets,
            IncomingOutcome::Rows(rows) => rows.len() as u64,
            IncomingOutcome::Statistic { relationships, .. } => *relationships,
        };
        let (result, relationship_count) = split_outcome(outcome);
        Ok(NodeAggregateResult {
            node_id: node_id.to_string(),
            aggregation: aggregation.kind,
            result,
            relationship_count,
            target_nodes_found,
        })
    }

    fn value_column(&self, aggregation: &IncomingAggregation) -> String {
        let property = aggregation.property_name.as_deref().unwrap_or_default();
        match aggregation.kind {
            AggregationKind::Count | AggregationKind::List => {
                if aggregation.target_label.as_deref() == Some(self.vocabulary.item_label.as_str())
                {
                    "Assets".to_string()
                } else {
                    "Count".to_string()
                }
            }
            AggregationKind::Sum => format!("Sum of {}", property),
            AggregationKind::Avg => format!("Average {}", property),
            AggregationKind::Min => format!("Minimum {}", property),
            AggregationKind::Max => format!("Maximum {}", property),
        }
    }

    /// Full count of nodes carrying `label`.
    pub async fn count_by_label(&self, label: &str) -> Result<LabelCount, EngineError> {
        self.require_label("label", label).await?;
        let total_count = self.store.count_by_label(label).await?;
        Ok(LabelCount {
            label: label.to_string(),
            total_count,
        })
    }

    /// Count nodes named `name`, per label.
    pub async fn count_by_name(
        &self,
        name: &str,
        label: Option<&str>,
        match_mode: MatchMode,
    ) -> Result<NameCount, EngineError> {
        let labels = self.lookup_order(label).await?;
        let mut by_label = Vec::with_capacity(labels.len());
        for label in labels {
            let count = self.store.count_by_name(&label, name, match_mode).await?;
            by_label.push(LabelTally { label, count });
        }
        let total_count = by_label.iter().map(|t| t.count).sum();
        Ok(NameCount {
            name: name.to_string(),
            found: total_count > 0,
            total_count,
            by_label,
        })
    }

    /// Fresh schema; also refreshes the shared cache.
    pub async fn schema_introspection(&self) -> Result<SchemaSummary, EngineError> {
        self.cache.force_refresh().await?;
        Ok(self.cache.schema().await?.into())
    }

    /// Run an ad hoc read query behind the read-only gate.
    pub async fn raw_query(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<RawQueryResult, EngineError> {
        let limit = limit.unwrap_or(self.raw_query_limit);
        let prepared = match prepare_read_query(query, limit) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!("⚠️ Rejected raw query: {}", e);
                return Err(e);
            }
        };
        let rows = self.store.run_read_query(&prepared).await?;
        Ok(RawQueryResult {
            query: prepared,
            count: rows.len(),
            result: rows,
        })
    }
}

fn split_outcome(outcome: IncomingOutcome) -> (AggregateValue, u64) {
    match outcome {
        IncomingOutcome::Count {
            targets,
            relationships,
        } => (AggregateValue::Count(targets), relationships),
        IncomingOutcome::Rows(rows) => {
            let n = rows.len() as u64;
            (AggregateValue::Rows(rows), n)
        }
        IncomingOutcome::Statistic {
            value,
            relationships,
        } => (AggregateValue::Statistic(value), relationships),
    }
}

/// Fold per-node results into a total.
///
/// Counts, lists and sums add up. Averages are weighted by the number of
/// contributing edges; minima and maxima combine.
fn fold_total(kind: AggregationKind, per_node: &[NodeAggregate]) -> TotalValue {
    let stats = || {
        per_node.iter().filter_map(|p| match p.result {
            AggregateValue::Statistic(Some(v)) => Some((v, p.relationship_count)),
            _ => None,
        })
    };
    match kind {
        AggregationKind::Count | AggregationKind::List => {
            TotalValue::Count(per_node.iter().map(|p| p.result.measure() as u64).sum())
        }
        AggregationKind::Sum => {
            TotalValue::Statistic(Some(per_node.iter().map(|p| p.result.measure()).sum()))
        }
        AggregationKind::Avg => {
            let (weighted, weight) = stats().fold((0.0, 0u64), |(s, w), (v, n)| {
                (s + v * n as f64, w + n)
            });
            TotalValue::Statistic((weight > 0).then(|| weighted / weight as f64))
        }
        AggregationKind::Min => TotalValue::Statistic(stats().map(|(v, _)| v).reduce(f64::min)),
        AggregationKind::Max => TotalValue::Statistic(stats().map(|(v, _)| v).reduce(f64::max)),
    }
}

#[cfg(test)]
#[path = "aggregation_engine_test.rs"]
mod aggregation_engine_test;
