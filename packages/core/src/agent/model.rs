//! Model boundary
//!
//! The orchestrator only needs one call: send the system instructions, the
//! conversation and optionally the tool catalogue; get back text and/or
//! tool invocations. [`ModelClient`] is that contract, so the loop can run
//! against the Anthropic API or a scripted client in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::conversation::Turn;
use crate::tools::ToolDefinition;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("No model API key configured (set ANTHROPIC_API_KEY or CLAUDE_API_KEY)")]
    MissingCredentials,

    #[error("Model transport error: {0}")]
    Transport(String),

    #[error("Model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed model response: {0}")]
    MalformedResponse(String),
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlates the eventual tool result with this call
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

/// One outbound model call.
#[derive(Debug, Clone, Copy)]
pub struct ModelRequest<'a> {
    pub model: &'a str,
    pub system: &'a str,
    pub turns: &'a [Turn],
    /// `None` forces a text-only answer
    pub tools: Option<&'a [ToolDefinition]>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: Option<String>,
    pub tool_invocations: Vec<ToolInvocation>,
}

impl ModelResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_invocations: Vec::new(),
        }
    }

    pub fn tools(tool_invocations: Vec<ToolInvocation>) -> Self {
        Self {
            text: None,
            tool_invocations,
        }
    }

    /// Text with surrounding whitespace removed, `None` when blank.
    pub fn answer(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError>;
}
