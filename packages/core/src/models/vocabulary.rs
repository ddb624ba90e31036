//! Names of the labels and relationship types the engine relies on.
//!
//! Containment edges point from the contained entity to its container, so
//! every "items in X" question is an incoming-edge aggregation at X.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BreakdownDimension {
    Location,
    System,
    Context,
    Both,
}

impl BreakdownDimension {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakdownDimension::Location => "Location",
            BreakdownDimension::System => "System",
            BreakdownDimension::Context => "Context",
            BreakdownDimension::Both => "Both",
        }
    }

    /// Single dimensions a request expands to.
    pub fn expand(self) -> Vec<BreakdownDimension> {
        match self {
            BreakdownDimension::Both => vec![
                BreakdownDimension::Location,
                BreakdownDimension::System,
                BreakdownDimension::Context,
            ],
            single => vec![single],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryScope {
    Location,
    System,
    Both,
}

impl CategoryScope {
    pub fn expand(self) -> Vec<CategoryScope> {
        match self {
            CategoryScope::Both => vec![CategoryScope::Location, CategoryScope::System],
            single => vec![single],
        }
    }
}

/// Container label plus the relationship linking items into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentRule {
    pub container_label: String,
    pub relationship_type: String,
}

/// Category membership of a member label plus how items reach members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub member_label: String,
    pub membership_relationship: String,
    pub containment_relationship: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphVocabulary {
    /// Preferred name-lookup order
    pub label_priority: Vec<String>,
    /// Labels used when the live schema reports none
    pub fallback_labels: Vec<String>,
    /// Labels the parent-scope filter applies to
    pub container_labels: Vec<String>,
    /// Relationship walked to reach a parent container
    pub hierarchy_relationship: String,
    pub item_label: String,
    pub category_label: String,
    pub category_hierarchy_relationship: String,
    pub location: ContainmentRule,
    pub system: ContainmentRule,
    pub context: ContainmentRule,
    pub location_categories: CategoryRule,
    pub system_categories: CategoryRule,
}

impl Default for GraphVocabulary {
    fn default() -> Self {
        let s = |v: &str| v.to_string();
        Self {
            label_priority: vec![
                s("Location"),
                s("Context"),
                s("System"),
                s("Asset"),
                s("Category"),
            ],
            fallback_labels: vec![
                s("Asset"),
                s("Category"),
                s("Location"),
                s("MeasuringUnit"),
                s("Signal"),
                s("System"),
            ],
            container_labels: vec![s("Location"), s("Context")],
            hierarchy_relationship: s("LOCATED_IN"),
            item_label: s("Asset"),
            category_label: s("Category"),
            category_hierarchy_relationship: s("BELONGS_TO"),
            location: ContainmentRule {
                container_label: s("Location"),
                relationship_type: s("LOCATED_IN"),
            },
            system: ContainmentRule {
                container_label: s("System"),
                relationship_type: s("PART_OF_SYSTEM"),
            },
            context: ContainmentRule {
                container_label: s("Context"),
                relationship_type: s("LOCATED_IN"),
            },
            location_categories: CategoryRule {
                member_label: s("Location"),
                membership_relationship: s("BELONGS_TO_LOCATION_CATEGORY"),
                containment_relationship: s("LOCATED_IN"),
            },
            system_categories: CategoryRule {
                member_label: s("System"),
                membership_relationship: s("BELONG_TO_SYSTEM_CATEGORY"),
                containment_relationship: s("PART_OF_SYSTEM"),
            },
        }
    }
}

impl GraphVocabulary {
    pub fn containment(&self, dimension: BreakdownDimension) -> Option<&ContainmentRule> {
        match dimension {
            BreakdownDimension::Location => Some(&self.location),
            BreakdownDimension::System => Some(&self.system),
            BreakdownDimension::Context => Some(&self.context),
            BreakdownDimension::Both => None,
        }
    }

    pub fn category_rule(&self, scope: CategoryScope) -> Option<&CategoryRule> {
        match scope {
            CategoryScope::Location => Some(&self.location_categories),
            CategoryScope::System => Some(&self.system_categories),
            CategoryScope::Both => None,
        }
    }

    pub fn is_container_label(&self, label: &str) -> bool {
        self.container_labels.iter().any(|l| l == label)
    }

    /// Lookup order over the known labels: preferred labels first, then the
    /// rest alphabetically.
    pub fn ordered_labels(&self, known: &[String]) -> Vec<String> {
        let mut ordered: Vec<String> = self
            .label_priority
            .iter()
            .filter(|l| known.contains(l))
            .cloned()
            .collect();
        let mut rest: Vec<String> = known
            .iter()
            .filter(|l| !self.label_priority.contains(l))
            .cloned()
            .collect();
        rest.sort();
        rest.dedup();
        ordered.extend(rest);
        ordered
    }
}
