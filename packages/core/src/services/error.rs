//! Service Layer Error Types
//!
//! This module defines error types for aggregation engine operations. Every
//! variant is reported back to the model as a structured tool result, so the
//! messages are written for a reader that can correct its own arguments.

use thiserror::Error;

use crate::db::GraphError;
use crate::models::ValidityError;

pub const READ_ONLY_MESSAGE: &str = "Read-only mode: query must not contain write or admin operations \
(e.g. CREATE, MERGE, DELETE, SET, REMOVE, DROP, DETACH, EXPLAIN, PROFILE, or schema operations). \
Use only MATCH, RETURN, WITH, OPTIONAL MATCH, etc.";

/// Aggregation engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Caller input rejected before any query ran
    #[error("{0}")]
    Validation(String),

    /// Raw query contains a denied keyword
    #[error("{}", READ_ONLY_MESSAGE)]
    ReadOnlyViolation,

    /// `as_of_date` could not be parsed
    #[error(transparent)]
    InvalidValidity(#[from] ValidityError),

    /// Graph store failure
    #[error("Graph query failed: {0}")]
    Graph(#[from] GraphError),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn empty_relationship_types() -> Self {
        Self::validation("relationship_types cannot be empty")
    }

    /// `field` is not one of the currently known labels
    pub fn unknown_label(field: &str, known: &[String]) -> Self {
        Self::validation(format!("{} must be one of [{}]", field, known.join(", ")))
    }

    pub fn missing_property(kind: &str) -> Self {
        Self::validation(format!(
            "property_name is required for aggregation '{}'",
            kind
        ))
    }

    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::ReadOnlyViolation | Self::InvalidValidity(_)
        )
    }
}
