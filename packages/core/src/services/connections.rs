//! Describe how a named node is wired into the graph.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::aggregation_engine::GraphAggregationEngine;
use super::error::EngineError;
use crate::models::{Connection, ResolveMode, ResolveRequest};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionsResult {
    pub name: String,
    pub found: bool,
    pub node_id: Option<String>,
    pub label: Option<String>,
    pub incoming: Vec<Connection>,
    pub outgoing: Vec<Connection>,
    pub incoming_count: usize,
    pub outgoing_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl GraphAggregationEngine {
    /// Incoming and outgoing relationships of the first node named `name`.
    pub async fn describe_connections(
        &self,
        name: &str,
        include_attributes: bool,
    ) -> Result<ConnectionsResult, EngineError> {
        let request = ResolveRequest::new(name).with_mode(ResolveMode::First);
        let Some(node) = self.resolve_by_name(&request).await?.into_iter().next() else {
            let searched = self.vocabulary.ordered_labels(&self.known_labels().await?);
            return Ok(ConnectionsResult {
                name: name.to_string(),
                found: false,
                node_id: None,
                label: None,
                incoming: Vec::new(),
                outgoing: Vec::new(),
                incoming_count: 0,
                outgoing_count: 0,
                attributes: None,
                message: Some(format!(
                    "No node found with this name (searched {}).",
                    searched.join(", ")
                )),
            });
        };

        let connections = self.store.node_connections(&node.node_id).await?;
        Ok(ConnectionsResult {
            name: name.to_string(),
            found: true,
            incoming_count: connections.incoming.len(),
            outgoing_count: connections.outgoing.len(),
            incoming: connections.incoming,
            outgoing: connections.outgoing,
            node_id: Some(node.node_id),
            label: Some(node.label),
            attributes: include_attributes.then_some(node.attributes),
            message: None,
        })
    }
}
