//! Runtime application configuration
//!
//! AppConfig is the single source of truth for what the running process uses.
//! It is read once from environment variables at startup and is immutable for
//! the process lifetime. Absent variables fall back to defaults; a variable
//! that is present but unparsable is an error.

use std::env;
use std::str::FromStr;

use thiserror::Error;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_MAX_ITERATIONS: usize = 5;
pub const DEFAULT_RAW_QUERY_LIMIT: usize = 1000;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// Neo4j connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Neo4jSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Database name, server default when `None`
    pub database: Option<String>,
    pub max_connections: usize,
}

/// Model provider settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
}

/// Orchestrator settings.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentSettings {
    pub max_iterations: usize,
    /// Final-answer character cap, 0 disables truncation
    pub max_response_length: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub neo4j: Neo4jSettings,
    pub model: ModelSettings,
    pub agent: AgentSettings,
    pub raw_query_limit: usize,
    pub server_host: String,
    /// HTTP port (from SERVER_PORT env var or default 8000)
    pub server_port: u16,
    /// JSON graph fixture served instead of Neo4j when set
    pub graph_fixture: Option<String>,
}

impl AppConfig {
    /// Build config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(AppConfig {
            neo4j: Neo4jSettings {
                uri: text("NEO4J_URI", "bolt://localhost:7687"),
                user: text("NEO4J_USER", "neo4j"),
                password: text("NEO4J_PASSWORD", ""),
                database: optional("NEO4J_DATABASE"),
                max_connections: parsed(&lookup, "NEO4J_MAX_CONNECTIONS", 16)?,
            },
            model: ModelSettings {
                api_key: optional("ANTHROPIC_API_KEY").or_else(|| optional("CLAUDE_API_KEY")),
                base_url: text("ANTHROPIC_BASE_URL", "https://api.anthropic.com"),
                model: text("CLAUDE_MODEL", DEFAULT_MODEL),
                max_tokens: parsed(&lookup, "MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            },
            agent: AgentSettings {
                max_iterations: parsed(&lookup, "AGENT_MAX_ITERATIONS", DEFAULT_MAX_ITERATIONS)?,
                max_response_length: parsed(&lookup, "MAX_RESPONSE_LENGTH", 0)?,
            },
            raw_query_limit: parsed(&lookup, "RAW_QUERY_LIMIT", DEFAULT_RAW_QUERY_LIMIT)?,
            server_host: text("SERVER_HOST", "0.0.0.0"),
            server_port: parsed(&lookup, "SERVER_PORT", 8000)?,
            graph_fixture: optional("GRAPH_FIXTURE"),
        })
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}
