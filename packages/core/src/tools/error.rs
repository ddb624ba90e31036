//! Tool Layer Error Types
//!
//! A `ToolError` never crosses the tool boundary as an `Err`. The dispatcher
//! folds it into a failure envelope so the model sees the message as a tool
//! result and can correct its own arguments.

use thiserror::Error;

use crate::services::EngineError;

#[derive(Error, Debug)]
pub enum ToolError {
    /// Tool name not present in the catalogue
    #[error("Tool '{0}' not found")]
    UnknownTool(String),

    /// Arguments do not match the tool's declared parameters
    #[error("Invalid parameters for '{tool}': {message}")]
    InvalidParams { tool: String, message: String },

    /// Validation failure reported by the engine
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Collaborator or unexpected failure inside a tool
    #[error("Error executing tool: {0}")]
    Execution(String),
}

impl ToolError {
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    pub fn invalid_params(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParams {
            tool: tool.into(),
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }
}
