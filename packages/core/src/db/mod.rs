//! Graph Database Layer
//!
//! This module handles all graph database interactions:
//!
//! - [`GraphStore`] - Read-only primitives the aggregation engine composes
//! - [`Neo4jStore`] - Neo4j backend over Bolt with a lazily created pool
//! - [`MemoryGraph`] - In-process backend for tests, benches and demo mode
//!
//! # Architecture
//!
//! The engine never sees backend handles. Every store method returns plain
//! records defined in [`crate::models`], and errors surface as [`GraphError`].

pub mod cypher;
mod error;
mod graph_store;
mod memory_store;
mod neo4j_store;

pub use error::GraphError;
pub use graph_store::GraphStore;
pub use memory_store::{MemoryGraph, MemoryRelationship};
pub use neo4j_store::Neo4jStore;
