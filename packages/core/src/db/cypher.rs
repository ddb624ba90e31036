//! Cypher text builders for the Neo4j backend.
//!
//! Labels, relationship types and property names cannot be query parameters,
//! so they are checked against the identifier grammar and backtick-quoted.
//! Every value goes through a `$parameter`.

use std::sync::OnceLock;

use regex::Regex;

use super::GraphError;
use crate::models::{IncomingMeasure, IncomingSpec, MatchMode, ParentScope, ValidityFilter};

fn identifier_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Whether `ident` is a plain label, relationship type or property name.
pub fn is_identifier(ident: &str) -> bool {
    identifier_regex().is_match(ident)
}

/// Backtick-quote an identifier after checking it.
pub fn quote(ident: &str) -> Result<String, GraphError> {
    if is_identifier(ident) {
        Ok(format!("`{}`", ident))
    } else {
        Err(GraphError::invalid_identifier(ident))
    }
}

/// `A|B|C` relationship type alternation.
pub fn relationship_alternation(types: &[String]) -> Result<String, GraphError> {
    let quoted = types
        .iter()
        .map(|t| quote(t))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(quoted.join("|"))
}

pub fn name_condition(var: &str, match_mode: MatchMode) -> String {
    match match_mode {
        MatchMode::Exact => format!("toLower({var}.name) = toLower($name)"),
        MatchMode::Prefix => format!("toLower({var}.name) STARTS WITH toLower($name)"),
    }
}

/// Validity predicate on relationship variable `rel`, or `None` when unfiltered.
///
/// The as-of form expects `$as_of_date`.
pub fn validity_condition(filter: ValidityFilter, rel: &str) -> Option<String> {
    match filter {
        ValidityFilter::Unfiltered => None,
        ValidityFilter::CurrentOnly => Some(format!(
            "({rel}.validity_to IS NULL OR {rel}.validity_to = '')"
        )),
        ValidityFilter::AsOf(_) => Some(format!(
            "{rel}.validity_from <= datetime($as_of_date) AND \
             ({rel}.validity_to IS NULL OR {rel}.validity_to = '' OR {rel}.validity_to >= datetime($as_of_date))"
        )),
    }
}

pub fn find_by_name(
    label: &str,
    match_mode: MatchMode,
    scope: Option<&ParentScope>,
    limit: Option<usize>,
) -> Result<String, GraphError> {
    let mut cypher = format!(
        "MATCH (n:{}) WHERE {}",
        quote(label)?,
        name_condition("n", match_mode)
    );
    if let Some(scope) = scope {
        let ancestors = scope
            .ancestor_labels
            .iter()
            .map(|l| quote(l).map(|q| format!("parent:{}", q)))
            .collect::<Result<Vec<_>, _>>()?;
        let ancestor_clause = if ancestors.is_empty() {
            "true".to_string()
        } else {
            format!("({})", ancestors.join(" OR "))
        };
        cypher.push_str(&format!(
            " AND EXISTS {{ (n)-[:{}*]->(parent) WHERE {} AND toLower(parent.name) = toLower($parent_name) }}",
            quote(&scope.relationship_type)?,
            ancestor_clause
        ));
    }
    cypher.push_str(" RETURN elementId(n) AS node_id, labels(n) AS labels, properties(n) AS props");
    if limit.is_some() {
        cypher.push_str(" LIMIT $limit");
    }
    Ok(cypher)
}

pub fn count_by_name(label: &str, match_mode: MatchMode) -> Result<String, GraphError> {
    Ok(format!(
        "MATCH (n:{}) WHERE {} RETURN count(n) AS c",
        quote(label)?,
        name_condition("n", match_mode)
    ))
}

pub fn count_by_label(label: &str) -> Result<String, GraphError> {
    Ok(format!("MATCH (n:{}) RETURN count(n) AS total", quote(label)?))
}

/// Incoming-edge aggregation anchored at `$start_node_id`.
pub fn aggregate_incoming(spec: &IncomingSpec) -> Result<String, GraphError> {
    let target = match &spec.target_label {
        Some(label) => format!("target:{}", quote(label)?),
        None => "target".to_string(),
    };
    let mut conditions: Vec<String> = validity_condition(spec.validity, "r").into_iter().collect();
    let ret = match &spec.measure {
        IncomingMeasure::Count => {
            "RETURN count(target) AS result, count(r) AS rel_count".to_string()
        }
        IncomingMeasure::List { .. } => {
            "RETURN elementId(target) AS target_id, properties(target) AS props LIMIT $limit"
                .to_string()
        }
        IncomingMeasure::Statistic { function, property } => {
            let prop = format!("target.{}", quote(property)?);
            conditions.push(format!("{} IS NOT NULL", prop));
            format!(
                "RETURN toFloat({}({})) AS result, count(r) AS rel_count",
                function.cypher_name(),
                prop
            )
        }
    };
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    Ok(format!(
        "MATCH (start) WHERE elementId(start) = $start_node_id \
         MATCH ({})-[r:{}]->(start){} {}",
        target,
        relationship_alternation(&spec.relationship_types)?,
        where_clause,
        ret
    ))
}

pub fn container_counts(
    container_label: &str,
    relationship_type: &str,
    item_label: &str,
    validity: ValidityFilter,
) -> Result<String, GraphError> {
    let optional_validity = validity_condition(validity, "r")
        .map(|c| format!(" WHERE r IS NULL OR ({})", c))
        .unwrap_or_default();
    Ok(format!(
        "MATCH (container:{}) \
         OPTIONAL MATCH (a:{})-[r:{}]->(container){} \
         WITH container, count(a) AS cnt \
         RETURN elementId(container) AS node_id, container.name AS name, \
         container.fingerprint AS fingerprint, cnt \
         ORDER BY container.fingerprint",
        quote(container_label)?,
        quote(item_label)?,
        quote(relationship_type)?,
        optional_validity
    ))
}

pub fn category_names(
    member_label: &str,
    membership_relationship: &str,
    category_label: &str,
) -> Result<String, GraphError> {
    Ok(format!(
        "MATCH (m:{})-[:{}]->(cat:{}) \
         RETURN DISTINCT cat.name AS category_name ORDER BY category_name",
        quote(member_label)?,
        quote(membership_relationship)?,
        quote(category_label)?
    ))
}

pub fn category_counts(
    member_label: &str,
    membership_relationship: &str,
    containment_relationship: &str,
    category_label: &str,
    item_label: &str,
    validity: ValidityFilter,
) -> Result<String, GraphError> {
    let optional_validity = validity_condition(validity, "r_in")
        .map(|c| format!(" WHERE r_in IS NULL OR ({})", c))
        .unwrap_or_default();
    Ok(format!(
        "MATCH (cat:{}) WHERE cat.name IN $category_names \
         OPTIONAL MATCH (m:{})-[:{}]->(cat) \
         OPTIONAL MATCH (a:{})-[r_in:{}]->(m){} \
         WITH cat.name AS category_name, cat.fingerprint AS category_fingerprint, \
         count(DISTINCT a) AS item_count, count(DISTINCT m) AS member_count \
         RETURN category_name, category_fingerprint, item_count, member_count \
         ORDER BY category_name",
        quote(category_label)?,
        quote(member_label)?,
        quote(membership_relationship)?,
        quote(item_label)?,
        quote(containment_relationship)?,
        optional_validity
    ))
}

pub fn categories(category_label: &str) -> Result<String, GraphError> {
    Ok(format!(
        "MATCH (c:{}) RETURN elementId(c) AS node_id, c.name AS name, \
         c.fingerprint AS fingerprint ORDER BY c.name",
        quote(category_label)?
    ))
}

pub fn category_links(category_label: &str, relationship_type: &str) -> Result<String, GraphError> {
    let label = quote(category_label)?;
    Ok(format!(
        "MATCH (from:{label})-[r:{}]->(to:{label}) \
         RETURN from.name AS from_name, to.name AS to_name, type(r) AS relationship_type \
         ORDER BY from.name, to.name",
        quote(relationship_type)?
    ))
}

pub const OUTGOING_CONNECTIONS: &str = "MATCH (start) WHERE elementId(start) = $node_id \
     MATCH (start)-[r]->(other) \
     RETURN type(r) AS rel_type, elementId(other) AS other_id, other.name AS other_name, \
     labels(other)[0] AS other_label, other.fingerprint AS other_fingerprint \
     ORDER BY type(r), other.name";

pub const INCOMING_CONNECTIONS: &str = "MATCH (start) WHERE elementId(start) = $node_id \
     MATCH (other)-[r]->(start) \
     RETURN type(r) AS rel_type, elementId(other) AS other_id, other.name AS other_name, \
     labels(other)[0] AS other_label, other.fingerprint AS other_fingerprint \
     ORDER BY type(r), other.name";

pub const SCHEMA_LABELS: &str = "CALL db.labels() YIELD label RETURN label ORDER BY label";

pub const SCHEMA_RELATIONSHIP_TYPES: &str = "CALL db.relationshipTypes() YIELD relationshipType \
     RETURN relationshipType ORDER BY relationshipType";

pub const SCHEMA_PROPERTY_KEYS: &str =
    "CALL db.propertyKeys() YIELD propertyKey RETURN propertyKey ORDER BY propertyKey";
