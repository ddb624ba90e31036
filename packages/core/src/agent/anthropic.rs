//! Anthropic Messages API client.
//!
//! Turns map onto content blocks: user text, assistant `text` plus
//! `tool_use` blocks, and tool results as a user turn of `tool_result`
//! blocks. Response `text` blocks are joined with a newline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::debug;

use super::conversation::Turn;
use super::model::{ModelClient, ModelError, ModelRequest, ModelResponse, ToolInvocation};
use crate::config::ModelSettings;

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self, ModelError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ModelError::MissingCredentials);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &ModelSettings) -> Result<Self, ModelError> {
        let api_key = settings
            .api_key
            .clone()
            .ok_or(ModelError::MissingCredentials)?;
        Self::new(api_key, settings.base_url.clone())
    }
}

/// Request body for `/v1/messages`.
pub fn request_body(request: &ModelRequest<'_>) -> Value {
    let messages: Vec<Value> = request.turns.iter().map(turn_to_message).collect();
    let mut body = json!({
        "model": request.model,
        "max_tokens": request.max_tokens,
        "system": request.system,
        "messages": messages,
    });
    if let Some(tools) = request.tools {
        body["tools"] = Value::Array(
            tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.input_schema,
                    })
                })
                .collect(),
        );
    }
    body
}

fn turn_to_message(turn: &Turn) -> Value {
    match turn {
        Turn::User(text) => json!({"role": "user", "content": text}),
        Turn::Assistant {
            text,
            tool_invocations,
        } => {
            let mut blocks = Vec::new();
            if let Some(text) = text.as_deref().filter(|t| !t.trim().is_empty()) {
                blocks.push(json!({"type": "text", "text": text}));
            }
            blocks.extend(tool_invocations.iter().map(|call| {
                json!({
                    "type": "tool_use",
                    "id": call.id,
                    "name": call.name,
                    "input": call.arguments,
                })
            }));
            json!({"role": "assistant", "content": blocks})
        }
        Turn::ToolResults(results) => {
            let blocks: Vec<Value> = results
                .iter()
                .map(|r| {
                    json!({
                        "type": "tool_result",
                        "tool_use_id": r.invocation_id,
                        "content": r.content,
                    })
                })
                .collect();
            json!({"role": "user", "content": blocks})
        }
    }
}

/// Read `text` and `tool_use` blocks from a response body.
pub fn parse_response(body: &Value) -> Result<ModelResponse, ModelError> {
    let blocks = body["content"]
        .as_array()
        .ok_or_else(|| ModelError::MalformedResponse("missing content array".to_string()))?;

    let mut texts = Vec::new();
    let mut tool_invocations = Vec::new();
    for block in blocks {
        match block["type"].as_str() {
            Some("text") => {
                if let Some(text) = block["text"].as_str() {
                    texts.push(text.to_string());
                }
            }
            Some("tool_use") => {
                let id = block["id"].as_str();
                let name = block["name"].as_str();
                let (Some(id), Some(name)) = (id, name) else {
                    return Err(ModelError::MalformedResponse(
                        "tool_use block without id or name".to_string(),
                    ));
                };
                tool_invocations.push(ToolInvocation {
                    id: id.to_string(),
                    name: name.to_string(),
                    arguments: block.get("input").cloned().unwrap_or_else(|| json!({})),
                });
            }
            _ => {}
        }
    }

    Ok(ModelResponse {
        text: (!texts.is_empty()).then(|| texts.join("\n")),
        tool_invocations,
    })
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn complete(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let url = format!("{}/v1/messages", self.base_url);
        let body = request_body(&request);
        debug!(
            "Calling {} with {} turn(s), tools: {}",
            request.model,
            request.turns.len(),
            request.tools.map_or(0, <[_]>::len)
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| ModelError::MalformedResponse(e.to_string()))?;
        parse_response(&data)
    }
}
