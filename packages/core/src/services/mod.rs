//! Graph Services
//!
//! This module contains the graph aggregation engine and its supporting
//! services:
//!
//! - `GraphAggregationEngine` - Name resolution, incoming-edge aggregation,
//!   label counts, schema introspection and the raw read query
//! - Breakdowns - Items per container dimension and per category
//! - `SchemaCache` - Process-wide discovered labels and categories
//! - Read guard - Denylist gate for caller-supplied queries
//! - Summary tables - The stable markdown breakdown format
//!
//! Services coordinate between the graph store and the tool layer,
//! validating input and shaping every result into a plain record.

mod aggregation_engine;
mod breakdown;
mod connections;
pub mod error;
pub mod read_guard;
pub mod schema_cache;
pub mod summary_table;

pub use aggregation_engine::{
    GraphAggregationEngine, LabelCount, LabelTally, NameCount, NodeAggregateResult, NodeLookup,
    RawQueryResult, SchemaSummary,
};
pub use breakdown::{
    BreakdownResult, CategoryCountsResult, CategoryListing, DimensionBreakdown, HierarchyLink,
    ScopeCategoryCounts,
};
pub use connections::ConnectionsResult;
pub use error::EngineError;
pub use schema_cache::{CacheStats, SchemaCache};
