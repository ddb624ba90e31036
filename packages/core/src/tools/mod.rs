//! Tool Layer
//!
//! The boundary between the model and the aggregation engine:
//!
//! - `catalogue` - Static tool definitions with JSON input schemas
//! - `coercion` - Tolerance for malformed model arguments
//! - `params` - Typed parameters per tool
//! - `envelope` - `{ok, value | error}` results with a success discriminant
//! - `dispatcher` - Name to operation routing, plus collaborator tools

pub mod catalogue;
pub mod coercion;
mod dispatcher;
pub mod envelope;
mod error;
pub mod params;

pub use catalogue::{graph_tool_definitions, GraphTool, ToolCategory, ToolDefinition};
pub use coercion::coerce_arguments;
pub use dispatcher::{Collaborator, ToolDispatcher};
pub use envelope::{ToolOutcome, ToolPayload};
pub use error::ToolError;
