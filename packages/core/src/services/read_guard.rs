//! Read-only gate for caller-supplied queries.
//!
//! The raw query operation is the only one that accepts query structure from
//! the caller. Anything that can write, change the schema, manage databases or
//! expose execution plans is rejected before the query reaches a store.

use std::sync::OnceLock;

use regex::Regex;

use super::error::EngineError;

fn denied_keywords() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(CREATE|MERGE|DELETE|SET|REMOVE|DROP|DETACH|FOREACH|LOAD\s+CSV|EXPLAIN|PROFILE|START\s+DATABASE|STOP\s+DATABASE|CREATE\s+INDEX|CREATE\s+CONSTRAINT|DROP\s+INDEX|DROP\s+CONSTRAINT)\b",
        )
        .unwrap()
    })
}

/// A `LIMIT` that ends the query. Limits inside literals or on an inner
/// `WITH` do not cap the result.
fn trailing_limit() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bLIMIT\s+(\d+|\$\w+)\s*$").unwrap())
}

/// Check a raw query and return the text to execute.
///
/// Trailing semicolons are stripped and ` LIMIT {limit}` is appended when the
/// query does not already end with a limit.
pub fn prepare_read_query(query: &str, limit: usize) -> Result<String, EngineError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(EngineError::validation("Query cannot be empty"));
    }
    if denied_keywords().is_match(query) {
        return Err(EngineError::ReadOnlyViolation);
    }
    let normalized = query.trim_end_matches(';').trim_end();
    if trailing_limit().is_match(normalized) {
        Ok(normalized.to_string())
    } else {
        Ok(format!("{} LIMIT {}", normalized, limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_appends_limit_when_missing() {
        assert_eq!(
            prepare_read_query("MATCH (n:Asset) RETURN n.name;", 50).unwrap(),
            "MATCH (n:Asset) RETURN n.name LIMIT 50"
        );
        assert_eq!(
            prepare_read_query("MATCH (n) RETURN n\nLIMIT 5", 50).unwrap(),
            "MATCH (n) RETURN n\nLIMIT 5"
        );
    }

    #[test]
    fn test_only_a_trailing_limit_counts() {
        assert_eq!(
            prepare_read_query("MATCH (n:Asset) WHERE n.name CONTAINS ' limit ' RETURN n", 10)
                .unwrap(),
            "MATCH (n:Asset) WHERE n.name CONTAINS ' limit ' RETURN n LIMIT 10"
        );
        assert_eq!(
            prepare_read_query(
                "MATCH (n:Location) WITH n LIMIT 1 MATCH (a)-[:LOCATED_IN]->(n) RETURN a",
                10
            )
            .unwrap(),
            "MATCH (n:Location) WITH n LIMIT 1 MATCH (a)-[:LOCATED_IN]->(n) RETURN a LIMIT 10"
        );
        assert_eq!(
            prepare_read_query("MATCH (n) RETURN n limit $max ;", 10).unwrap(),
            "MATCH (n) RETURN n limit $max"
        );
    }

    #[test]
    fn test_rejects_write_schema_and_plan_keywords() {
        for query in [
            "CREATE (n:Asset {name: 'x'})",
            "match (n) detach delete n",
            "MATCH (n) SET n.name = 'x' RETURN n",
            "DROP INDEX asset_name",
            "EXPLAIN MATCH (n) RETURN n",
            "profile MATCH (n) RETURN n",
            "CALL apoc.create.node(['Asset'], {}) YIELD node RETURN node",
            "LOAD CSV FROM 'file:///x.csv' AS row RETURN row",
        ] {
            assert!(
                matches!(
                    prepare_read_query(query, 10),
                    Err(EngineError::ReadOnlyViolation)
                ),
                "query should be rejected: {}",
                query
            );
        }
    }

    #[test]
    fn test_keywords_inside_identifiers_are_allowed() {
        assert!(prepare_read_query("MATCH (n:Asset) RETURN n.created_at, n.settings", 10).is_ok());
        assert!(prepare_read_query("MATCH (n:Dataset) RETURN n", 10).is_ok());
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let err = prepare_read_query("   ", 10).unwrap_err();
        assert_eq!(err.to_string(), "Query cannot be empty");
    }
}
