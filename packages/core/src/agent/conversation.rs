//! Per-request conversation state.
//!
//! Created when a query arrives and dropped once the answer is returned.
//! Nothing here is shared between requests.

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::model::{ModelResponse, ToolInvocation};
use crate::tools::ToolOutcome;

/// One turn of the conversation sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Turn {
    User(String),
    Assistant {
        text: Option<String>,
        tool_invocations: Vec<ToolInvocation>,
    },
    /// Results of one batch of tool calls, sent back as a single user turn
    ToolResults(Vec<ToolResultBlock>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResultBlock {
    pub invocation_id: String,
    /// Serialized result envelope
    pub content: String,
}

/// Audit entry for a tool call as the model issued it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCallRecord {
    pub tool_name: String,
    pub arguments: Value,
}

/// Audit entry for the result of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResultRecord {
    pub tool_name: String,
    pub result: ToolOutcome,
}

#[derive(Debug, Clone)]
pub struct ConversationState {
    /// Correlates log lines of one request
    pub request_id: Uuid,
    pub turns: Vec<Turn>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub tool_results: Vec<ToolResultRecord>,
    /// Outer passes consumed so far
    pub passes: usize,
}

impl ConversationState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            turns: vec![Turn::User(query.into())],
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
            passes: 0,
        }
    }

    pub fn push_assistant(&mut self, response: ModelResponse) {
        self.turns.push(Turn::Assistant {
            text: response.text,
            tool_invocations: response.tool_invocations,
        });
    }

    pub fn push_user(&mut self, text: impl Into<String>) {
        self.turns.push(Turn::User(text.into()));
    }

    /// Record one executed call in the audit trail.
    pub fn record(&mut self, invocation: &ToolInvocation, outcome: ToolOutcome) -> ToolResultBlock {
        let block = ToolResultBlock {
            invocation_id: invocation.id.clone(),
            content: outcome.to_json().to_string(),
        };
        self.tool_calls.push(ToolCallRecord {
            tool_name: invocation.name.clone(),
            arguments: invocation.arguments.clone(),
        });
        self.tool_results.push(ToolResultRecord {
            tool_name: invocation.name.clone(),
            result: outcome,
        });
        block
    }

    pub fn push_tool_results(&mut self, blocks: Vec<ToolResultBlock>) {
        self.turns.push(Turn::ToolResults(blocks));
    }
}
