//! Data Models
//!
//! This module contains the plain data structures shared by the graph store,
//! the aggregation engine and the tool layer:
//!
//! - `NodeRecord` / `ResolvedNode` - Graph nodes converted to plain records
//! - `ValidityFilter` - Bitemporal rule for which relationships count
//! - `AggregationRequest` / `AggregationResult` - Engine input and output
//! - `SchemaSnapshot` - Labels, relationship types and property keys
//! - `GraphVocabulary` - Label and relationship names the engine relies on
//!
//! Every type here is serializable so nothing opaque leaves the engine.

mod aggregation;
mod graph;
mod schema;
mod validity;
mod vocabulary;

pub use aggregation::{
    AggregateValue, AggregationKind, AggregationRequest, AggregationResult, IncomingAggregation,
    IncomingMeasure, IncomingOutcome, IncomingSpec, NodeAggregate, StatFunction, TotalValue,
};
pub use graph::{
    CategoryCount, CategoryLink, CategoryNode, Connection, ConnectionDirection, ContainerCount,
    MatchMode, NodeConnections, NodeRecord, ParentScope, ResolveMode, ResolveRequest,
    ResolvedNode,
};
pub use schema::SchemaSnapshot;
pub use validity::{parse_instant, ValidityError, ValidityFilter, ValiditySpec};
pub use vocabulary::{
    BreakdownDimension, CategoryRule, CategoryScope, ContainmentRule, GraphVocabulary,
};
