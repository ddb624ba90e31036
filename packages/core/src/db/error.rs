//! Graph Store Error Types
//!
//! This module defines error types for graph store operations, providing
//! clear error handling for connection, query and row decoding failures.

use thiserror::Error;

/// Graph store operation errors
///
/// Covers connection set-up, query execution and row decoding. Validation
/// of caller input happens in the service layer before a store is reached.
#[derive(Error, Debug)]
pub enum GraphError {
    /// Failed to establish the database connection pool
    #[error("Failed to connect to graph database at {uri}: {message}")]
    ConnectionFailed { uri: String, message: String },

    /// Query execution failed
    #[error("Graph query failed: {0}")]
    QueryFailed(String),

    /// A returned row could not be decoded
    #[error("Failed to decode column '{column}': {message}")]
    DecodeFailed { column: String, message: String },

    /// Label, relationship type or property name that cannot be quoted safely
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// Fixture could not be loaded into the in-memory store
    #[error("Failed to load graph fixture: {0}")]
    FixtureFailed(String),
}

impl GraphError {
    /// Create a connection failed error
    pub fn connection_failed(uri: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::ConnectionFailed {
            uri: uri.into(),
            message: source.to_string(),
        }
    }

    /// Create a query failed error
    pub fn query(source: impl std::fmt::Display) -> Self {
        Self::QueryFailed(source.to_string())
    }

    /// Create a decode failed error for a column
    pub fn decode(column: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::DecodeFailed {
            column: column.into(),
            message: source.to_string(),
        }
    }

    pub fn invalid_identifier(ident: impl Into<String>) -> Self {
        Self::InvalidIdentifier(ident.into())
    }

    pub fn fixture(source: impl std::fmt::Display) -> Self {
        Self::FixtureFailed(source.to_string())
    }
}
