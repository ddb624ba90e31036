//! Graph schema snapshot.

use serde::{Deserialize, Serialize};

/// Number of property keys listed in the summary line.
const SUMMARY_PROPERTY_KEYS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub labels: Vec<String>,
    pub relationship_types: Vec<String>,
    pub property_keys: Vec<String>,
}

impl SchemaSnapshot {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.relationship_types.is_empty()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn has_relationship_type(&self, rel_type: &str) -> bool {
        self.relationship_types.iter().any(|r| r == rel_type)
    }

    /// One-paragraph description handed to the model.
    pub fn summary(&self) -> String {
        let shown: Vec<&str> = self
            .property_keys
            .iter()
            .take(SUMMARY_PROPERTY_KEYS)
            .map(String::as_str)
            .collect();
        let ellipsis = if self.property_keys.len() > SUMMARY_PROPERTY_KEYS {
            "..."
        } else {
            ""
        };
        format!(
            "Labels ({}): {}. Relationship types ({}): {}. Property keys ({}): {}{}",
            self.labels.len(),
            self.labels.join(", "),
            self.relationship_types.len(),
            self.relationship_types.join(", "),
            self.property_keys.len(),
            shown.join(", "),
            ellipsis
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_caps_property_keys() {
        let snapshot = SchemaSnapshot {
            labels: vec!["Asset".into(), "Location".into()],
            relationship_types: vec!["LOCATED_IN".into()],
            property_keys: (0..25).map(|i| format!("k{:02}", i)).collect(),
        };
        let summary = snapshot.summary();
        assert!(summary.starts_with("Labels (2): Asset, Location. Relationship types (1): LOCATED_IN."));
        assert!(summary.contains("Property keys (25): k00"));
        assert!(summary.contains("k19..."));
        assert!(!summary.contains("k20"));
    }
}
