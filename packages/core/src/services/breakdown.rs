//! Whole-graph breakdowns: items per container and per category.

use serde::{Deserialize, Serialize};
use tracing::info;

use super::aggregation_engine::GraphAggregationEngine;
use super::error::EngineError;
use super::summary_table::{breakdown_table, category_table, combined_tables, TableRow};
use crate::models::{
    BreakdownDimension, CategoryCount, CategoryLink, CategoryNode, CategoryScope, ContainerCount,
    ValidityFilter, ValiditySpec,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionBreakdown {
    pub dimension: BreakdownDimension,
    pub container_label: String,
    pub per_container: Vec<ContainerCount>,
    pub total_result: u64,
    pub summary_table: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownResult {
    pub container_type: BreakdownDimension,
    pub breakdown: Vec<DimensionBreakdown>,
    /// Sum for a single dimension; the largest sub-total for `Both`
    pub total_count: u64,
    pub summary_table: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeCategoryCounts {
    pub scope: CategoryScope,
    pub categories: Vec<CategoryCount>,
    pub total_items: u64,
    pub summary_table: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryCountsResult {
    pub category_scope: CategoryScope,
    pub scopes: Vec<ScopeCategoryCounts>,
    pub summary_table: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyLink {
    pub from_category: String,
    pub to_category: String,
    pub relationship_type: String,
    pub description: String,
}

impl From<CategoryLink> for HierarchyLink {
    fn from(link: CategoryLink) -> Self {
        Self {
            description: link.describe(),
            from_category: link.from,
            to_category: link.to,
            relationship_type: link.relationship_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryListing {
    pub categories: Vec<CategoryNode>,
    pub category_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_hierarchy: Option<Vec<HierarchyLink>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy_description: Option<String>,
}

impl GraphAggregationEngine {
    /// Item counts for every container of one or all containment dimensions.
    pub async fn count_breakdown(
        &self,
        container_type: BreakdownDimension,
        validity: &ValiditySpec,
    ) -> Result<BreakdownResult, EngineError> {
        let filter = ValidityFilter::from_spec(validity)?;
        let item_label = self.vocabulary.item_label.clone();

        let mut breakdown = Vec::new();
        for dimension in container_type.expand() {
            let Some(rule) = self.vocabulary.containment(dimension) else {
                continue;
            };
            let per_container = self
                .store
                .container_counts(rule, &item_label, filter)
                .await?;
            let total_result: u64 = per_container.iter().map(|c| c.count).sum();
            let rows: Vec<TableRow> = per_container
                .iter()
                .map(|c| TableRow::new(c.fingerprint.as_deref(), c.count))
                .collect();
            let summary_table = breakdown_table(
                &rule.container_label,
                "Assets",
                &rows,
                &total_result.to_string(),
            );
            breakdown.push(DimensionBreakdown {
                dimension,
                container_label: rule.container_label.clone(),
                per_container,
                total_result,
                summary_table,
            });
        }

        // Items can sit under several dimensions at once; take the largest view
        let total_count = breakdown.iter().map(|b| b.total_result).max().unwrap_or(0);
        let summary_table = match container_type {
            BreakdownDimension::Both => combined_tables(
                &breakdown
                    .iter()
                    .map(|b| (b.dimension.as_str().to_string(), b.summary_table.clone()))
                    .collect::<Vec<_>>(),
            ),
            _ => breakdown
                .first()
                .map(|b| b.summary_table.clone())
                .unwrap_or_default(),
        };

        info!(
            "📊 Breakdown by {}: {} item(s)",
            container_type.as_str(),
            total_count
        );
        Ok(BreakdownResult {
            container_type,
            breakdown,
            total_count,
            summary_table,
        })
    }

    /// Item counts per category for location and/or system categories.
    pub async fn count_by_category(
        &self,
        category_scope: CategoryScope,
        validity: &ValiditySpec,
    ) -> Result<CategoryCountsResult, EngineError> {
        let filter = ValidityFilter::from_spec(validity)?;
        let category_label = self.vocabulary.category_label.clone();
        let item_label = self.vocabulary.item_label.clone();

        let mut scopes = Vec::new();
        for scope in category_scope.expand() {
            let Some(rule) = self.vocabulary.category_rule(scope) else {
                continue;
            };
            let names = self.cache.category_names(rule, &category_label).await?;
            let categories = if names.is_empty() {
                Vec::new()
            } else {
                self.store
                    .category_counts(rule, &category_label, &item_label, &names, filter)
                    .await?
            };
            let total_items = categories.iter().map(|c| c.item_count).sum();
            let summary_table = category_table(&rule.member_label, &categories, total_items);
            scopes.push(ScopeCategoryCounts {
                scope,
                categories,
                total_items,
                summary_table,
            });
        }

        let summary_table = match category_scope {
            CategoryScope::Both => scopes
                .iter()
                .map(|s| {
                    format!(
                        "**By {} category**\n\n{}",
                        scope_name(s.scope),
                        s.summary_table
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
            _ => scopes
                .first()
                .map(|s| s.summary_table.clone())
                .unwrap_or_default(),
        };

        Ok(CategoryCountsResult {
            category_scope,
            scopes,
            summary_table,
        })
    }

    /// All category nodes, optionally with the links between them.
    pub async fn list_categories(
        &self,
        include_hierarchy: bool,
    ) -> Result<CategoryListing, EngineError> {
        let category_label = &self.vocabulary.category_label;
        let categories = self.store.categories(category_label).await?;

        let (category_hierarchy, hierarchy_description) = if include_hierarchy {
            let rel = &self.vocabulary.category_hierarchy_relationship;
            let links: Vec<HierarchyLink> = self
                .store
                .category_links(category_label, rel)
                .await?
                .into_iter()
                .map(HierarchyLink::from)
                .collect();
            let description = if links.is_empty() {
                format!("No {} links between categories.", rel)
            } else {
                format!(
                    "Category hierarchy ({}): {}",
                    rel,
                    links
                        .iter()
                        .map(|l| l.description.as_str())
                        .collect::<Vec<_>>()
                        .join("; ")
                )
            };
            (Some(links), Some(description))
        } else {
            (None, None)
        };

        Ok(CategoryListing {
            category_count: categories.len(),
            categories,
            category_hierarchy,
            hierarchy_description,
        })
    }
}

fn scope_name(scope: CategoryScope) -> &'static str {
    match scope {
        CategoryScope::Location => "location",
        CategoryScope::System => "system",
        CategoryScope::Both => "all",
    }
}
