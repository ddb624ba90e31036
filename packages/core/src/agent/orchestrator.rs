//! Agent Orchestrator
//!
//! Drives one bounded conversation with the model per user query.
//!
//! # Loop
//!
//! Each outer pass calls the model with the instructions, the tool catalogue
//! and the full conversation, then:
//!
//! - **Planning text, no tool calls yet**: append a corrective user turn and
//!   loop again
//! - **Other text, no tool calls**: final answer
//! - **Tool calls**: dispatch them, append the results as one turn and, if
//!   any result answered something, make one summary call. A summary that
//!   asks for more tools runs them and continues the loop; non-planning text
//!   is the final answer
//!
//! When `max_iterations` passes are spent, one text-only close-out call is
//! made. If that yields nothing, the answer lists every attempted tool call.
//!
//! Model transport failures end the request with [`AgentError`]. Tool
//! failures never do: they go back to the model as tool results.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::conversation::{ConversationState, ToolCallRecord, ToolResultRecord};
use super::instructions::{NUDGE_MESSAGE, SYSTEM_INSTRUCTIONS};
use super::model::{ModelClient, ModelError, ModelRequest, ModelResponse};
use super::planning::is_planning_text;
use super::truncate::truncate_response;
use crate::config::{AppConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::tools::{ToolDefinition, ToolDispatcher};

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Query cannot be empty")]
    EmptyQuery,

    #[error("Error calling model: {0}")]
    Model(#[from] ModelError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub model: String,
    pub max_tokens: u32,
    pub max_iterations: usize,
    /// 0 disables truncation
    pub max_response_length: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_response_length: 0,
        }
    }
}

impl From<&AppConfig> for OrchestratorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            model: config.model.model.clone(),
            max_tokens: config.model.max_tokens,
            max_iterations: config.agent.max_iterations,
            max_response_length: config.agent.max_response_length,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalState {
    /// The model gave a final answer
    Done,
    /// The pass budget ran out before a final answer
    Exhausted,
}

/// Answer plus the audit trail of every tool call made for it.
#[derive(Debug, Clone, Serialize)]
pub struct AgentOutcome {
    pub request_id: Uuid,
    pub response: String,
    pub state: TerminalState,
    pub tool_calls: Vec<ToolCallRecord>,
    pub tool_results: Vec<ToolResultRecord>,
    pub passes: usize,
}

pub struct Orchestrator {
    model: Arc<dyn ModelClient>,
    dispatcher: Arc<ToolDispatcher>,
    settings: OrchestratorSettings,
    instructions: String,
}

impl Orchestrator {
    pub fn new(
        model: Arc<dyn ModelClient>,
        dispatcher: Arc<ToolDispatcher>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            model,
            dispatcher,
            settings,
            instructions: SYSTEM_INSTRUCTIONS.to_string(),
        }
    }

    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    pub fn dispatcher(&self) -> &Arc<ToolDispatcher> {
        &self.dispatcher
    }

    /// Answer `query`, optionally with a different model than configured.
    pub async fn run(
        &self,
        query: &str,
        model_override: Option<&str>,
    ) -> Result<AgentOutcome, AgentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AgentError::EmptyQuery);
        }
        let model = model_override
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(self.settings.model.as_str());
        let tools = self.dispatcher.definitions();
        let mut state = ConversationState::new(query);
        info!(
            "🤖 [{}] Answering query with {}: {}",
            state.request_id, model, query
        );

        while state.passes < self.settings.max_iterations {
            state.passes += 1;
            let response = self.call(model, &state, Some(tools.as_slice())).await?;

            if response.tool_invocations.is_empty() {
                let Some(text) = response.answer().map(str::to_string) else {
                    break;
                };
                if state.tool_calls.is_empty() && is_planning_text(&text) {
                    info!("🔁 Planning text without tool calls, nudging (pass {})", state.passes);
                    state.push_assistant(response);
                    state.push_user(NUDGE_MESSAGE);
                    continue;
                }
                state.push_assistant(response);
                return Ok(self.finish(text, TerminalState::Done, state));
            }

            if !self.execute_batch(&mut state, response).await {
                continue;
            }

            let summary = self.call(model, &state, Some(tools.as_slice())).await?;
            if !summary.tool_invocations.is_empty() {
                self.execute_batch(&mut state, summary).await;
                continue;
            }
            if let Some(text) = summary.answer().map(str::to_string) {
                if !is_planning_text(&text) {
                    state.push_assistant(summary);
                    return Ok(self.finish(text, TerminalState::Done, state));
                }
            }
        }

        warn!(
            "⚠️ No final answer after {} pass(es), requesting close-out",
            state.passes
        );
        let answer = match self.call(model, &state, None).await {
            Ok(response) => match response.answer() {
                Some(text) => text.to_string(),
                None => attempted_calls_message(&state.tool_calls),
            },
            Err(e) => {
                warn!("⚠️ Close-out call failed: {}", e);
                format!(
                    "I tried {} tool call(s) but encountered an error: {}",
                    state.tool_calls.len(),
                    e
                )
            }
        };
        Ok(self.finish(answer, TerminalState::Exhausted, state))
    }

    async fn call(
        &self,
        model: &str,
        state: &ConversationState,
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ModelResponse, ModelError> {
        let request = ModelRequest {
            model,
            system: &self.instructions,
            turns: &state.turns,
            tools,
            max_tokens: self.settings.max_tokens,
        };
        self.model.complete(request).await.map_err(|e| {
            error!("❌ Model call failed: {}", e);
            e
        })
    }

    /// Run every requested tool and append the results as one turn.
    ///
    /// Returns whether any result answered something.
    async fn execute_batch(&self, state: &mut ConversationState, response: ModelResponse) -> bool {
        let invocations = response.tool_invocations.clone();
        state.push_assistant(response);

        let mut successful = false;
        let mut blocks = Vec::with_capacity(invocations.len());
        for invocation in &invocations {
            let outcome = self
                .dispatcher
                .dispatch(&invocation.name, invocation.arguments.clone())
                .await;
            successful |= outcome.is_success();
            blocks.push(state.record(invocation, outcome));
        }
        state.push_tool_results(blocks);
        info!(
            "🔧 Executed {} tool call(s), successful: {}",
            invocations.len(),
            successful
        );
        successful
    }

    fn finish(&self, text: String, terminal: TerminalState, state: ConversationState) -> AgentOutcome {
        info!(
            "✅ [{}] Finished in {} pass(es) with {} tool call(s) ({:?})",
            state.request_id,
            state.passes,
            state.tool_calls.len(),
            terminal
        );
        AgentOutcome {
            request_id: state.request_id,
            response: truncate_response(&text, self.settings.max_response_length),
            state: terminal,
            tool_calls: state.tool_calls,
            tool_results: state.tool_results,
            passes: state.passes,
        }
    }
}

fn attempted_calls_message(calls: &[ToolCallRecord]) -> String {
    let listing = serde_json::to_string_pretty(calls).unwrap_or_default();
    format!(
        "I tried {} tool call(s) but couldn't find the requested information. \
         Here's what I attempted:\n\n{}",
        calls.len(),
        listing
    )
}
