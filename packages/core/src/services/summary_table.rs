//! Markdown breakdown tables.
//!
//! The two-column layout (container display key, numeric result) with a
//! trailing bold total row is consumed verbatim by the model when it presents
//! counts, so its shape must not drift.

use crate::models::{CategoryCount, NodeAggregate};

pub const NO_FINGERPRINT: &str = "(no fingerprint)";

/// One table row: display key and rendered value.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub key: String,
    pub value: String,
}

impl TableRow {
    pub fn new(fingerprint: Option<&str>, value: impl ToString) -> Self {
        Self {
            key: fingerprint
                .filter(|f| !f.is_empty())
                .unwrap_or(NO_FINGERPRINT)
                .to_string(),
            value: value.to_string(),
        }
    }
}

pub fn breakdown_table(
    container_label: &str,
    value_column: &str,
    rows: &[TableRow],
    total: &str,
) -> String {
    let mut lines = vec![
        format!("| {} (fingerprint) | {} |", container_label, value_column),
        "| --- | --- |".to_string(),
    ];
    if rows.is_empty() {
        lines.push("| *(none)* | 0 |".to_string());
    }
    lines.extend(rows.iter().map(|r| format!("| {} | {} |", r.key, r.value)));
    lines.push(format!("| **Total** | **{}** |", total));
    lines.join("\n")
}

pub fn rows_from_aggregates(per_node: &[NodeAggregate]) -> Vec<TableRow> {
    per_node
        .iter()
        .map(|p| TableRow::new(p.fingerprint.as_deref(), p.result.display()))
        .collect()
}

/// Per-dimension tables under `**By {dimension}**` headings.
pub fn combined_tables(sections: &[(String, String)]) -> String {
    sections
        .iter()
        .map(|(dimension, table)| format!("**By {}**\n\n{}", dimension, table))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// `member_kind` names the member column, e.g. "Location".
pub fn category_table(member_kind: &str, rows: &[CategoryCount], total_items: u64) -> String {
    let mut lines = vec![
        format!("| Category | Asset count | {} count |", member_kind),
        "| --- | --- | --- |".to_string(),
    ];
    lines.extend(rows.iter().map(|r| {
        format!(
            "| {} | {} | {} |",
            r.category_name, r.item_count, r.member_count
        )
    }));
    lines.push(format!(
        "| **Total ({} categories)** | **{}** | — |",
        member_kind.to_lowercase(),
        total_items
    ));
    lines.join("\n")
}
