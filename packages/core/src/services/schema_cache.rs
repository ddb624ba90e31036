//! Process-wide cache of discovered graph schema
//!
//! Holds the labels, relationship types and property keys of the live graph,
//! plus the category names each category rule resolves to. Label validation
//! and category discovery read from here instead of querying on every call.
//!
//! # Cache Invalidation
//!
//! There is no time-based expiry. The cache is refreshed on first access and
//! after [`SchemaCache::invalidate`], which the graph-reset signal calls once
//! the graph has been re-imported. Invalidation is a flag flip and is safe
//! while other requests are reading.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::db::{GraphError, GraphStore};
use crate::models::{CategoryRule, SchemaSnapshot};

pub struct SchemaCache {
    store: Arc<dyn GraphStore>,

    /// Last fetched schema, `None` until the first refresh
    schema: RwLock<Option<SchemaSnapshot>>,

    /// Map: member label → category names discovered for it
    categories: RwLock<HashMap<String, Vec<String>>>,

    last_refresh: RwLock<Option<Instant>>,

    /// Set by `invalidate`, cleared when a refresh starts
    invalidated: AtomicBool,
}

impl SchemaCache {
    /// Create an empty cache; it is populated on first access.
    pub fn new(store: Arc<dyn GraphStore>) -> Self {
        Self {
            store,
            schema: RwLock::new(None),
            categories: RwLock::new(HashMap::new()),
            last_refresh: RwLock::new(None),
            invalidated: AtomicBool::new(false),
        }
    }

    /// Current schema, refreshed first if stale.
    pub async fn schema(&self) -> Result<SchemaSnapshot, GraphError> {
        if self.needs_refresh().await {
            self.refresh().await?;
        }
        let schema = self.schema.read().await;
        Ok(schema.clone().unwrap_or_default())
    }

    /// Category names for a rule, discovered from the graph on first use.
    pub async fn category_names(
        &self,
        rule: &CategoryRule,
        category_label: &str,
    ) -> Result<Vec<String>, GraphError> {
        if self.needs_refresh().await {
            self.refresh().await?;
        }
        if let Some(names) = self.categories.read().await.get(&rule.member_label) {
            return Ok(names.clone());
        }
        let names = self.store.category_names(rule, category_label).await?;
        debug!(
            "Discovered {} categories for {}",
            names.len(),
            rule.member_label
        );
        self.categories
            .write()
            .await
            .insert(rule.member_label.clone(), names.clone());
        Ok(names)
    }

    /// Mark everything stale; the next access refetches.
    pub fn invalidate(&self) {
        info!("🔄 Schema cache invalidated");
        self.invalidated.store(true, Ordering::Release);
    }

    /// Refetch now.
    pub async fn force_refresh(&self) -> Result<(), GraphError> {
        self.refresh().await
    }

    async fn needs_refresh(&self) -> bool {
        if self.invalidated.load(Ordering::Acquire) {
            return true;
        }
        self.last_refresh.read().await.is_none()
    }

    async fn refresh(&self) -> Result<(), GraphError> {
        // Cleared before fetching so an invalidation that lands mid-refresh survives
        self.invalidated.store(false, Ordering::Release);
        let snapshot = match self.store.schema().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                self.invalidated.store(true, Ordering::Release);
                return Err(e);
            }
        };
        debug!(
            "Schema refreshed: {} labels, {} relationship types",
            snapshot.labels.len(),
            snapshot.relationship_types.len()
        );

        *self.schema.write().await = Some(snapshot);
        self.categories.write().await.clear();
        *self.last_refresh.write().await = Some(Instant::now());
        Ok(())
    }

    /// Cache statistics (for debugging/monitoring)
    pub async fn stats(&self) -> CacheStats {
        let is_stale = self.needs_refresh().await;
        let last_refresh = *self.last_refresh.read().await;
        let category_rules = self.categories.read().await.len();
        let schema = self.schema.read().await;
        CacheStats {
            labels: schema.as_ref().map_or(0, |s| s.labels.len()),
            relationship_types: schema.as_ref().map_or(0, |s| s.relationship_types.len()),
            category_rules,
            last_refresh,
            is_stale,
        }
    }
}

/// Statistics about the schema cache
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub labels: usize,
    pub relationship_types: usize,
    /// Number of category rules with discovered names
    pub category_rules: usize,
    /// Last refresh time (None if never refreshed)
    pub last_refresh: Option<Instant>,
    pub is_stale: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryGraph;
    use crate::models::GraphVocabulary;
    use serde_json::json;

    #[tokio::test]
    async fn test_cache_starts_stale_and_refreshes_on_access() {
        let graph = Arc::new(MemoryGraph::new());
        graph.add_node(&["Asset"], json!({"name": "Pump"})).await;
        let cache = SchemaCache::new(graph.clone());

        assert!(cache.stats().await.is_stale);
        let schema = cache.schema().await.unwrap();
        assert_eq!(schema.labels, vec!["Asset"]);
        let stats = cache.stats().await;
        assert!(!stats.is_stale);
        assert!(stats.last_refresh.is_some());
    }

    #[tokio::test]
    async fn test_changes_are_invisible_until_invalidated() {
        let graph = Arc::new(MemoryGraph::new());
        graph.add_node(&["Asset"], json!({"name": "Pump"})).await;
        let cache = SchemaCache::new(graph.clone());
        cache.schema().await.unwrap();

        graph.add_node(&["Location"], json!({"name": "Hall 1"})).await;
        assert_eq!(cache.schema().await.unwrap().labels, vec!["Asset"]);

        cache.invalidate();
        assert_eq!(
            cache.schema().await.unwrap().labels,
            vec!["Asset", "Location"]
        );
    }

    #[tokio::test]
    async fn test_category_names_are_cached_per_rule() {
        let graph = Arc::new(MemoryGraph::new());
        let hall = graph.add_node(&["Location"], json!({"name": "Hall 1"})).await;
        let cat = graph.add_node(&["Category"], json!({"name": "Production"})).await;
        graph
            .relate(&hall, "BELONGS_TO_LOCATION_CATEGORY", &cat, json!({}))
            .await;
        let cache = SchemaCache::new(graph.clone());
        let vocab = GraphVocabulary::default();

        let names = cache
            .category_names(&vocab.location_categories, "Category")
            .await
            .unwrap();
        assert_eq!(names, vec!["Production"]);
        assert_eq!(cache.stats().await.category_rules, 1);

        cache.invalidate();
        cache.schema().await.unwrap();
        assert_eq!(cache.stats().await.category_rules, 0);
    }
}
