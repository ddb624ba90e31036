//! Integration tests for the agent loop with a scripted model
//!
//! Tests cover:
//! - Direct answers and tool-call-then-summary answers
//! - The corrective nudge after planning-only text
//! - Pass budget, close-out call and fallback messages
//! - Model failures and response truncation

mod common;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};

use assetgraph_core::agent::instructions::NUDGE_MESSAGE;
use assetgraph_core::agent::{
    ModelClient, ModelError, ModelRequest, ModelResponse, OrchestratorSettings, TerminalState,
    ToolInvocation, Turn,
};
use assetgraph_core::{AgentError, GraphAggregationEngine, Orchestrator, ToolDispatcher};
use common::plant_graph;

/// What the scripted model saw on one call.
#[derive(Debug, Clone)]
struct SeenCall {
    tools_offered: bool,
    last_turn: Turn,
}

/// Replays canned responses in order and records every request.
struct ScriptedModel {
    replies: Mutex<VecDeque<Result<ModelResponse, ModelError>>>,
    seen: Mutex<Vec<SeenCall>>,
    fallback: Option<ModelResponse>,
}

impl ScriptedModel {
    fn new(replies: Vec<Result<ModelResponse, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            seen: Mutex::new(Vec::new()),
            fallback: None,
        })
    }

    /// Answers every call beyond the script with `fallback`.
    fn repeating(fallback: ModelResponse) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            seen: Mutex::new(Vec::new()),
            fallback: Some(fallback),
        })
    }

    fn seen(&self) -> Vec<SeenCall> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        self.seen.lock().unwrap().push(SeenCall {
            tools_offered: request.tools.is_some(),
            last_turn: request.turns.last().cloned().unwrap_or(Turn::User(String::new())),
        });
        match self.replies.lock().unwrap().pop_front() {
            Some(reply) => reply,
            None => Ok(self
                .fallback
                .clone()
                .unwrap_or_else(|| ModelResponse::text(""))),
        }
    }
}

fn invoke(id: &str, name: &str, arguments: Value) -> ModelResponse {
    ModelResponse::tools(vec![ToolInvocation {
        id: id.to_string(),
        name: name.to_string(),
        arguments,
    }])
}

fn hall_count() -> ModelResponse {
    invoke(
        "toolu_1",
        "container_contents_count_by_name",
        json!({
            "name": "Hall 1",
            "relationship_types": "[\"LOCATED_IN\"]",
            "target_label": "Asset"
        }),
    )
}

async fn orchestrator(model: Arc<ScriptedModel>, settings: OrchestratorSettings) -> Orchestrator {
    let engine = Arc::new(GraphAggregationEngine::new(plant_graph().await));
    Orchestrator::new(model, Arc::new(ToolDispatcher::new(engine)), settings)
}

fn settings(max_iterations: usize) -> OrchestratorSettings {
    OrchestratorSettings {
        max_iterations,
        ..OrchestratorSettings::default()
    }
}

// =========================================================================
// Answer Path Tests
// =========================================================================

#[tokio::test]
async fn test_direct_answer_without_tools() -> Result<()> {
    let model = ScriptedModel::new(vec![Ok(ModelResponse::text("  Hello there.  "))]);
    let agent = orchestrator(model.clone(), settings(5)).await;

    let outcome = agent.run("Say hello", None).await?;
    assert_eq!(outcome.response, "Hello there.");
    assert_eq!(outcome.state, TerminalState::Done);
    assert_eq!(outcome.passes, 1);
    assert!(outcome.tool_calls.is_empty());
    assert_eq!(model.seen().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_successful_tool_call_is_followed_by_summary() -> Result<()> {
    let model = ScriptedModel::new(vec![
        Ok(hall_count()),
        Ok(ModelResponse::text("Hall 1 holds 2 assets.")),
    ]);
    let agent = orchestrator(model.clone(), settings(5)).await;

    let outcome = agent.run("How many assets are in Hall 1?", None).await?;
    assert_eq!(outcome.response, "Hall 1 holds 2 assets.");
    assert_eq!(outcome.state, TerminalState::Done);
    assert_eq!(outcome.passes, 1);
    assert_eq!(outcome.tool_calls.len(), 1);
    assert!(outcome.tool_results[0].result.is_success());
    let value = outcome.tool_results[0].result.to_json();
    assert_eq!(value["value"]["total_count"], 2);

    let seen = model.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|c| c.tools_offered));
    assert!(matches!(seen[1].last_turn, Turn::ToolResults(ref blocks) if blocks.len() == 1));
    Ok(())
}

#[tokio::test]
async fn test_summary_requesting_tools_continues_the_loop() -> Result<()> {
    let model = ScriptedModel::new(vec![
        Ok(hall_count()),
        Ok(invoke(
            "toolu_2",
            "describe_node_connections",
            json!({"name": "Hall 1"}),
        )),
        Ok(ModelResponse::text("Hall 1 is in Site A and holds 2 assets.")),
    ]);
    let agent = orchestrator(model.clone(), settings(5)).await;

    let outcome = agent.run("Where is Hall 1 and what is in it?", None).await?;
    assert_eq!(outcome.response, "Hall 1 is in Site A and holds 2 assets.");
    assert_eq!(outcome.passes, 2);
    let names: Vec<_> = outcome
        .tool_calls
        .iter()
        .map(|c| c.tool_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["container_contents_count_by_name", "describe_node_connections"]
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_tool_results_go_back_to_the_model() -> Result<()> {
    let model = ScriptedModel::new(vec![
        Ok(invoke("toolu_1", "count_widgets", json!({}))),
        Ok(ModelResponse::text("I could not count that.")),
    ]);
    let agent = orchestrator(model.clone(), settings(5)).await;

    let outcome = agent.run("Count widgets", None).await?;
    assert_eq!(outcome.response, "I could not count that.");
    assert_eq!(outcome.passes, 2);
    let failure = outcome.tool_results[0].result.to_json();
    assert_eq!(failure["ok"], false);
    assert_eq!(failure["error"], "Tool 'count_widgets' not found");
    Ok(())
}

// =========================================================================
// Nudge Tests
// =========================================================================

#[tokio::test]
async fn test_planning_text_is_nudged_once() -> Result<()> {
    let model = ScriptedModel::new(vec![
        Ok(ModelResponse::text("I'll check Hall 1 first.")),
        Ok(hall_count()),
        Ok(ModelResponse::text("Hall 1 holds 2 assets.")),
    ]);
    let agent = orchestrator(model.clone(), settings(5)).await;

    let outcome = agent.run("How many assets are in Hall 1?", None).await?;
    assert_eq!(outcome.response, "Hall 1 holds 2 assets.");
    assert_eq!(outcome.passes, 2);

    let nudges = model
        .seen()
        .iter()
        .filter(|c| c.last_turn == Turn::User(NUDGE_MESSAGE.to_string()))
        .count();
    assert_eq!(nudges, 1);
    assert_eq!(outcome.tool_calls.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_planning_text_after_tool_calls_is_a_final_answer() -> Result<()> {
    let model = ScriptedModel::new(vec![
        Ok(invoke("toolu_1", "get_node_by_name", json!({"name": "Hall 9"}))),
        Ok(ModelResponse::text("Let me check with a prefix search.")),
    ]);
    let agent = orchestrator(model.clone(), settings(5)).await;

    let outcome = agent.run("What is Hall 9?", None).await?;
    assert_eq!(outcome.response, "Let me check with a prefix search.");
    assert_eq!(outcome.state, TerminalState::Done);
    Ok(())
}

// =========================================================================
// Budget and Close-out Tests
// =========================================================================

#[tokio::test]
async fn test_pass_budget_bounds_the_loop() -> Result<()> {
    let model = ScriptedModel::repeating(ModelResponse::text("Let me look that up."));
    let agent = orchestrator(model.clone(), settings(3)).await;

    let outcome = agent.run("How many pumps?", None).await?;
    assert_eq!(outcome.state, TerminalState::Exhausted);
    assert_eq!(outcome.passes, 3);

    let seen = model.seen();
    // Three passes plus the close-out, which offers no tools
    assert_eq!(seen.len(), 4);
    assert!(!seen[3].tools_offered);
    assert_eq!(outcome.response, "Let me look that up.");
    Ok(())
}

#[tokio::test]
async fn test_empty_close_out_lists_attempted_calls() -> Result<()> {
    let model = ScriptedModel::new(vec![
        Ok(invoke("toolu_1", "get_node_by_name", json!({"name": "Hall 9"}))),
        Ok(invoke("toolu_2", "count_nodes_by_name", json!({"name": "Hall 9"}))),
        Ok(ModelResponse::text("")),
    ]);
    let agent = orchestrator(model.clone(), settings(2)).await;

    let outcome = agent.run("What is Hall 9?", None).await?;
    assert_eq!(outcome.state, TerminalState::Exhausted);
    assert!(outcome
        .response
        .starts_with("I tried 2 tool call(s) but couldn't find the requested information."));
    assert!(outcome.response.contains("count_nodes_by_name"));
    Ok(())
}

#[tokio::test]
async fn test_close_out_error_is_reported_in_the_answer() -> Result<()> {
    let model = ScriptedModel::new(vec![
        Ok(invoke("toolu_1", "get_node_by_name", json!({"name": "Hall 9"}))),
        Err(ModelError::Transport("connection reset".to_string())),
    ]);
    let agent = orchestrator(model.clone(), settings(1)).await;

    let outcome = agent.run("What is Hall 9?", None).await?;
    assert_eq!(outcome.state, TerminalState::Exhausted);
    assert!(outcome
        .response
        .starts_with("I tried 1 tool call(s) but encountered an error:"));
    assert!(outcome.response.contains("connection reset"));
    Ok(())
}

// =========================================================================
// Failure and Truncation Tests
// =========================================================================

#[tokio::test]
async fn test_model_error_during_loop_is_fatal() -> Result<()> {
    let model = ScriptedModel::new(vec![Err(ModelError::Status {
        status: 401,
        body: "invalid x-api-key".to_string(),
    })]);
    let agent = orchestrator(model, settings(5)).await;

    let err = agent.run("How many pumps?", None).await.unwrap_err();
    assert!(matches!(err, AgentError::Model(ModelError::Status { status: 401, .. })));
    Ok(())
}

#[tokio::test]
async fn test_empty_query_is_rejected_before_any_call() -> Result<()> {
    let model = ScriptedModel::new(Vec::new());
    let agent = orchestrator(model.clone(), settings(5)).await;

    let err = agent.run("   ", None).await.unwrap_err();
    assert!(matches!(err, AgentError::EmptyQuery));
    assert!(model.seen().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_long_answers_are_truncated() -> Result<()> {
    let long = format!("{} Final sentence here.", "word ".repeat(100));
    let model = ScriptedModel::new(vec![Ok(ModelResponse::text(long))]);
    let agent = orchestrator(
        model,
        OrchestratorSettings {
            max_response_length: 60,
            ..OrchestratorSettings::default()
        },
    )
    .await;

    let outcome = agent.run("Ramble", None).await?;
    assert!(outcome.response.ends_with("..."));
    assert!(outcome.response.chars().count() <= 63);
    Ok(())
}
