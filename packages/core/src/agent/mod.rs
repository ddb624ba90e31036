//! Agent Layer
//!
//! Everything between a natural-language query and its answer:
//!
//! - `model` - The model call contract and its error type
//! - `anthropic` - Messages API client over `reqwest`
//! - `conversation` - Per-request turns and the tool audit trail
//! - `planning` - Detection of announce-only responses
//! - `truncate` - Final-answer truncation at sentence or word boundaries
//! - `orchestrator` - The bounded conversation loop

pub mod anthropic;
pub mod conversation;
pub mod instructions;
pub mod model;
mod orchestrator;
pub mod planning;
pub mod truncate;

pub use anthropic::AnthropicClient;
pub use conversation::{ConversationState, ToolCallRecord, ToolResultBlock, ToolResultRecord, Turn};
pub use model::{ModelClient, ModelError, ModelRequest, ModelResponse, ToolInvocation};
pub use orchestrator::{AgentError, AgentOutcome, Orchestrator, OrchestratorSettings, TerminalState};
pub use planning::is_planning_text;
pub use truncate::truncate_response;
