//! Neo4j backend for [`GraphStore`].
//!
//! The `neo4rs` connection pool is created on first use and shared by every
//! request for the lifetime of the process. Each operation borrows a pooled
//! connection for its own queries; the connection goes back to the pool when
//! the row stream is dropped, on success and on error alike.

use async_trait::async_trait;
use neo4rs::{query, ConfigBuilder, Graph, Query, Row};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{cypher, GraphError, GraphStore};
use crate::config::Neo4jSettings;
use crate::models::{
    CategoryCount, CategoryLink, CategoryNode, CategoryRule, Connection, ConnectionDirection,
    ContainerCount, ContainmentRule, IncomingMeasure, IncomingOutcome, IncomingSpec, MatchMode,
    NodeConnections, NodeRecord, ParentScope, SchemaSnapshot, ValidityFilter,
};

pub struct Neo4jStore {
    settings: Neo4jSettings,
    graph: OnceCell<Graph>,
}

impl Neo4jStore {
    /// Create a store; no connection is made until the first query.
    pub fn new(settings: Neo4jSettings) -> Self {
        Self {
            settings,
            graph: OnceCell::new(),
        }
    }

    async fn graph(&self) -> Result<&Graph, GraphError> {
        self.graph
            .get_or_try_init(|| async {
                let settings = &self.settings;
                info!("🔌 Connecting to Neo4j at {}", settings.uri);
                let mut builder = ConfigBuilder::default()
                    .uri(settings.uri.as_str())
                    .user(settings.user.as_str())
                    .password(settings.password.as_str())
                    .max_connections(settings.max_connections);
                if let Some(db) = &settings.database {
                    builder = builder.db(db.as_str());
                }
                let config = builder
                    .build()
                    .map_err(|e| GraphError::connection_failed(&settings.uri, e))?;
                Graph::connect(config)
                    .await
                    .map_err(|e| GraphError::connection_failed(&settings.uri, e))
            })
            .await
    }

    async fn fetch(&self, q: Query) -> Result<Vec<Row>, GraphError> {
        let graph = self.graph().await?;
        let mut stream = graph.execute(q).await.map_err(GraphError::query)?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await.map_err(GraphError::query)? {
            rows.push(row);
        }
        Ok(rows)
    }

    async fn fetch_column<T: DeserializeOwned>(
        &self,
        q: Query,
        column: &str,
    ) -> Result<Vec<T>, GraphError> {
        self.fetch(q)
            .await?
            .iter()
            .map(|row| get(row, column))
            .collect()
    }

    async fn fetch_single_count(&self, q: Query, column: &str) -> Result<u64, GraphError> {
        let rows = self.fetch(q).await?;
        match rows.first() {
            Some(row) => Ok(get::<i64>(row, column)?.max(0) as u64),
            None => Ok(0),
        }
    }

    async fn connections(
        &self,
        cypher_text: &str,
        node_id: &str,
        direction: ConnectionDirection,
    ) -> Result<Vec<Connection>, GraphError> {
        let rows = self
            .fetch(query(cypher_text).param("node_id", node_id))
            .await?;
        rows.iter()
            .map(|row| {
                Ok(Connection {
                    direction,
                    relationship_type: get(row, "rel_type")?,
                    other_node_id: get(row, "other_id")?,
                    other_name: get(row, "other_name")?,
                    other_label: get(row, "other_label")?,
                    other_fingerprint: get(row, "other_fingerprint")?,
                })
            })
            .collect()
    }
}

fn get<T: DeserializeOwned>(row: &Row, column: &str) -> Result<T, GraphError> {
    row.get::<T>(column)
        .map_err(|e| GraphError::decode(column, e))
}

fn with_validity(q: Query, validity: ValidityFilter) -> Query {
    match validity.as_of_param() {
        Some(as_of) => q.param("as_of_date", as_of),
        None => q,
    }
}

fn node_record(row: &Row) -> Result<NodeRecord, GraphError> {
    Ok(NodeRecord {
        node_id: get(row, "node_id")?,
        labels: get(row, "labels")?,
        attributes: get::<Option<Map<String, Value>>>(row, "props")?.unwrap_or_default(),
    })
}

#[async_trait]
impl GraphStore for Neo4jStore {
    async fn schema(&self) -> Result<SchemaSnapshot, GraphError> {
        let labels = self
            .fetch_column(query(cypher::SCHEMA_LABELS), "label")
            .await?;
        let relationship_types = self
            .fetch_column(
                query(cypher::SCHEMA_RELATIONSHIP_TYPES),
                "relationshipType",
            )
            .await?;
        let property_keys = match self
            .fetch_column(query(cypher::SCHEMA_PROPERTY_KEYS), "propertyKey")
            .await
        {
            Ok(keys) => keys,
            Err(e) => {
                warn!("⚠️ Property key listing unavailable: {}", e);
                Vec::new()
            }
        };
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
        let text = cypher::find_by_name(label, match_mode, scope, limit)?;
        debug!("find_by_name: {}", text);
        let mut q = query(&text).param("name", name);
        if let Some(scope) = scope {
            q = q.param("parent_name", scope.name.as_str());
        }
        if let Some(limit) = limit {
            q = q.param("limit", limit as i64);
        }
        self.fetch(q).await?.iter().map(node_record).collect()
    }

    async fn count_by_name(
        &self,
        label: &str,
        name: &str,
        match_mode: MatchMode,
    ) -> Result<u64, GraphError> {
        let text = cypher::count_by_name(label, match_mode)?;
        self.fetch_single_count(query(&text).param("name", name), "c")
            .await
    }

    async fn count_by_label(&self, label: &str) -> Result<u64, GraphError> {
        let text = cypher::count_by_label(label)?;
        self.fetch_single_count(query(&text), "total").await
    }

    async fn aggregate_incoming(
        &self,
        node_id: &str,
        spec: &IncomingSpec,
    ) -> Result<IncomingOutcome, GraphError> {
        let text = cypher::aggregate_incoming(spec)?;
        debug!("aggregate_incoming: {}", text);
        let mut q = with_validity(query(&text).param("start_node_id", node_id), spec.validity);

        match &spec.measure {
            IncomingMeasure::Count => {
                let rows = self.fetch(q).await?;
                let (targets, relationships) = match rows.first() {
                    Some(row) => (get::<i64>(row, "result")?, get::<i64>(row, "rel_count")?),
                    None => (0, 0),
                };
                Ok(IncomingOutcome::Count {
                    targets: targets.max(0) as u64,
                    relationships: relationships.max(0) as u64,
                })
            }
            IncomingMeasure::List { limit, attributes } => {
                q = q.param("limit", *limit as i64);
                let rows = self.fetch(q).await?;
                let mut records = Vec::with_capacity(rows.len());
                for row in &rows {
                    let target_id: String = get(row, "target_id")?;
                    let props: Map<String, Value> =
                        get::<Option<Map<String, Value>>>(row, "props")?.unwrap_or_default();
                    let record = NodeRecord {
                        node_id: target_id.clone(),
                        labels: Vec::new(),
                        attributes: props,
                    };
                    let mut projected = record.projected(attributes.as_deref());
                    projected.insert("node_id".to_string(), Value::String(target_id));
                    records.push(projected);
                }
                Ok(IncomingOutcome::Rows(records))
            }
            IncomingMeasure::Statistic { .. } => {
                let rows = self.fetch(q).await?;
                let (value, relationships) = match rows.first() {
                    Some(row) => (
                        get::<Option<f64>>(row, "result")?,
                        get::<i64>(row, "rel_count")?,
                    ),
                    None => (None, 0),
                };
                Ok(IncomingOutcome::Statistic {
                    value,
                    relationships: relationships.max(0) as u64,
                })
            }
        }
    }

    async fn container_counts(
        &self,
        rule: &ContainmentRule,
        item_label: &str,
        validity: ValidityFilter,
    ) -> Result<Vec<ContainerCount>, GraphError> {
        let text = cypher::container_counts(
            &rule.container_label,
            &rule.relationship_type,
            item_label,
            validity,
        )?;
        let rows = self.fetch(with_validity(query(&text), validity)).await?;
        rows.iter()
            .map(|row| {
                Ok(ContainerCount {
                    node_id: get(row, "node_id")?,
                    name: get(row, "name")?,
                    fingerprint: get(row, "fingerprint")?,
                    count: get::<i64>(row, "cnt")?.max(0) as u64,
                })
            })
            .collect()
    }

    async fn category_names(
        &self,
        rule: &CategoryRule,
        category_label: &str,
    ) -> Result<Vec<String>, GraphError> {
        let text = cypher::category_names(
            &rule.member_label,
            &rule.membership_relationship,
            category_label,
        )?;
        let names: Vec<Option<String>> = self.fetch_column(query(&text), "category_name").await?;
        Ok(names.into_iter().flatten().collect())
    }

    async fn category_counts(
        &self,
        rule: &CategoryRule,
        category_label: &str,
        item_label: &str,
        category_names: &[String],
        validity: ValidityFilter,
    ) -> Result<Vec<CategoryCount>, GraphError> {
        let text = cypher::category_counts(
            &rule.member_label,
            &rule.membership_relationship,
            &rule.containment_relationship,
            category_label,
            item_label,
            validity,
        )?;
        let q = with_validity(
            query(&text).param("category_names", category_names.to_vec()),
            validity,
        );
        let rows = self.fetch(q).await?;
        rows.iter()
            .map(|row| {
                Ok(CategoryCount {
                    category_name: get(row, "category_name")?,
                    category_fingerprint: get(row, "category_fingerprint")?,
                    item_count: get::<i64>(row, "item_count")?.max(0) as u64,
                    member_count: get::<i64>(row, "member_count")?.max(0) as u64,
                })
            })
            .collect()
    }

    async fn categories(&self, category_label: &str) -> Result<Vec<CategoryNode>, GraphError> {
        let text = cypher::categories(category_label)?;
        let rows = self.fetch(query(&text)).await?;
        rows.iter()
            .map(|row| {
                Ok(CategoryNode {
                    node_id: get(row, "node_id")?,
                    name: get(row, "name")?,
                    fingerprint: get(row, "fingerprint")?,
                })
            })
            .collect()
    }

    async fn category_links(
        &self,
        category_label: &str,
        relationship_type: &str,
    ) -> Result<Vec<CategoryLink>, GraphError> {
        let text = cypher::category_links(category_label, relationship_type)?;
        let rows = self.fetch(query(&text)).await?;
        rows.iter()
            .map(|row| {
                Ok(CategoryLink {
                    from: get::<Option<String>>(row, "from_name")?.unwrap_or_default(),
                    to: get::<Option<String>>(row, "to_name")?.unwrap_or_default(),
                    relationship_type: get(row, "relationship_type")?,
                })
            })
            .collect()
    }

    async fn node_connections(&self, node_id: &str) -> Result<NodeConnections, GraphError> {
        let outgoing = self
            .connections(
                cypher::OUTGOING_CONNECTIONS,
                node_id,
                ConnectionDirection::Outgoing,
            )
            .await?;
        let incoming = self
            .connections(
                cypher::INCOMING_CONNECTIONS,
                node_id,
                ConnectionDirection::Incoming,
            )
            .await?;
        Ok(NodeConnections { incoming, outgoing })
    }

    async fn run_read_query(&self, text: &str) -> Result<Vec<Map<String, Value>>, GraphError> {
        debug!("run_read_query: {}", text);
        let rows = self.fetch(query(text)).await?;
        rows.iter()
            .map(|row| {
                row.to::<Map<String, Value>>()
                    .map_err(|e| GraphError::decode("*", e))
            })
            .collect()
    }
}
