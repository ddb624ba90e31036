//! GraphStore Trait - Graph Database Abstraction Layer
//!
//! This module defines the `GraphStore` trait: the read-only primitives the
//! aggregation engine composes into tool operations. Two backends implement it:
//!
//! - [`Neo4jStore`](super::Neo4jStore) - Cypher over Bolt via `neo4rs`
//! - [`MemoryGraph`](super::MemoryGraph) - In-process graph for tests and demos
//!
//! # Architecture
//!
//! - **Primitives only**: Validation, ordering of label lookups, deduplication,
//!   totals and table formatting live in the engine, not in the backends
//! - **Validated identifiers**: Labels, relationship types and property names
//!   arrive already checked against the live schema; backends still quote them
//! - **Scoped access**: Each call acquires a connection for its own queries and
//!   releases it before returning, whether it succeeded or not
//! - **Plain records**: Every method returns serializable records, never
//!   backend handles

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::GraphError;
use crate::models::{
    CategoryCount, CategoryLink, CategoryNode, CategoryRule, ContainerCount, ContainmentRule,
    IncomingOutcome, IncomingSpec, MatchMode, NodeConnections, NodeRecord, ParentScope,
    SchemaSnapshot, ValidityFilter,
};

/// Abstraction over the property graph the engine reads from.
///
/// Implementations must be `Send + Sync`; one store instance is shared by
/// every concurrent request.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Labels, relationship types and property keys currently in the graph
    async fn schema(&self) -> Result<SchemaSnapshot, GraphError>;

    /// Nodes carrying `label` whose name matches `name`
    ///
    /// When `scope` is given only nodes transitively under the named ancestor
    /// are returned. `limit` caps the number of rows.
    async fn find_by_name(
        &self,
        label: &str,
        name: &str,
        match_mode: MatchMode,
        scope: Option<&ParentScope>,
        limit: Option<usize>,
    ) -> Result<Vec<NodeRecord>, GraphError>;

    /// Number of nodes carrying `label` whose name matches `name`
    async fn count_by_name(
        &self,
        label: &str,
        name: &str,
        match_mode: MatchMode,
    ) -> Result<u64, GraphError>;

    /// Number of nodes carrying `label`
    async fn count_by_label(&self, label: &str) -> Result<u64, GraphError>;

    /// Aggregate incoming edges at one node
    async fn aggregate_incoming(
        &self,
        node_id: &str,
        spec: &IncomingSpec,
    ) -> Result<IncomingOutcome, GraphError>;

    /// Item counts for every container of a rule's label, zero counts included,
    /// ordered by fingerprint
    async fn container_counts(
        &self,
        rule: &ContainmentRule,
        item_label: &str,
        validity: ValidityFilter,
    ) -> Result<Vec<ContainerCount>, GraphError>;

    /// Names of categories that members of a rule point to
    async fn category_names(
        &self,
        rule: &CategoryRule,
        category_label: &str,
    ) -> Result<Vec<String>, GraphError>;

    /// Distinct item and member counts for each named category, ordered by name
    async fn category_counts(
        &self,
        rule: &CategoryRule,
        category_label: &str,
        item_label: &str,
        category_names: &[String],
        validity: ValidityFilter,
    ) -> Result<Vec<CategoryCount>, GraphError>;

    /// All category nodes ordered by name
    async fn categories(&self, category_label: &str) -> Result<Vec<CategoryNode>, GraphError>;

    /// Links between category nodes over `relationship_type`
    async fn category_links(
        &self,
        category_label: &str,
        relationship_type: &str,
    ) -> Result<Vec<CategoryLink>, GraphError>;

    /// Incoming and outgoing relationships of one node
    async fn node_connections(&self, node_id: &str) -> Result<NodeConnections, GraphError>;

    /// Execute a caller-supplied read query and return its rows
    ///
    /// The caller is responsible for the read-only check and the result cap.
    async fn run_read_query(&self, query: &str) -> Result<Vec<Map<String, Value>>, GraphError>;
}
