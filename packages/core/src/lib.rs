//! AssetGraph Core
//!
//! Answers natural-language questions about an asset graph by letting a
//! language model call a fixed catalogue of graph aggregation tools.
//!
//! # Architecture
//!
//! - **Aggregation engine**: name resolution under exact/prefix matching and
//!   label priority, incoming-edge aggregation under a bitemporal validity
//!   rule, per-container breakdowns with a stable table format
//! - **Graph stores**: `neo4rs` against Neo4j, or an in-memory graph for tests
//!   and demos, behind one `GraphStore` trait
//! - **Tools**: statically declared tool schemas, argument coercion and a
//!   uniform `{ok, value | error}` envelope
//! - **Agent**: a bounded conversation loop against the model with planning
//!   detection, success heuristics and answer truncation
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`models`] - Graph, validity, aggregation and vocabulary types
//! - [`db`] - Graph store trait and backends
//! - [`services`] - Aggregation engine, breakdowns, schema cache
//! - [`tools`] - Tool catalogue and dispatcher
//! - [`agent`] - Model client and orchestrator

pub mod agent;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
pub mod tools;

// Re-export commonly used types
pub use agent::{AgentError, AgentOutcome, AnthropicClient, ModelClient, Orchestrator};
pub use config::AppConfig;
pub use db::{GraphError, GraphStore, MemoryGraph, Neo4jStore};
pub use models::*;
pub use services::*;
pub use tools::{Collaborator, ToolDispatcher, ToolOutcome, ToolPayload};
