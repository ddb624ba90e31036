//! Argument coercion for model-supplied tool calls.
//!
//! Models regularly send an array parameter as a JSON-encoded string
//! (`"[\"LOCATED_IN\"]"`) or as a bracketed literal with single quotes
//! (`"['LOCATED_IN']"`). Coercion widens the accepted encodings for each
//! parameter according to the type the tool declares:
//!
//! 1. strict JSON decode of the string
//! 2. quoted-token extraction (arrays only)
//! 3. pass-through, leaving the shape check to report the mismatch
//!
//! Coercion never rejects anything.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use super::catalogue::ToolDefinition;

fn quoted_token() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["']([^"']+)["']"#).unwrap())
}

/// Normalize `arguments` against the parameter types `definition` declares.
///
/// A whole argument object sent as a JSON string is decoded first.
pub fn coerce_arguments(definition: &ToolDefinition, arguments: Value) -> Value {
    let arguments = match arguments {
        Value::String(text) => match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => Value::String(text),
        },
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    let Value::Object(map) = arguments else {
        return arguments;
    };

    let coerced = map
        .into_iter()
        .map(|(key, value)| {
            let value = match definition.parameter_type(&key) {
                Some("array") => coerce_array(value),
                Some("object") => coerce_object(value),
                Some("integer") => coerce_integer(value),
                Some("boolean") => coerce_boolean(value),
                _ => value,
            };
            (key, value)
        })
        .collect::<Map<String, Value>>();
    let coerced = Value::Object(coerced);
    debug!("🔧 Coerced arguments for {}: {}", definition.name, coerced);
    coerced
}

/// Array from a JSON string or a bracketed literal of quoted tokens.
pub fn coerce_array(value: Value) -> Value {
    let Value::String(text) = value else {
        return value;
    };
    let trimmed = text.trim();
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(trimmed) {
        return Value::Array(items);
    }
    let tokens: Vec<Value> = quoted_token()
        .captures_iter(trimmed)
        .map(|c| Value::String(c[1].to_string()))
        .collect();
    if tokens.is_empty() {
        Value::String(text)
    } else {
        Value::Array(tokens)
    }
}

/// Object from a JSON string.
pub fn coerce_object(value: Value) -> Value {
    match value {
        Value::String(text) => match serde_json::from_str::<Value>(text.trim()) {
            Ok(Value::Object(map)) => Value::Object(map),
            _ => Value::String(text),
        },
        other => other,
    }
}

fn coerce_integer(value: Value) -> Value {
    match value {
        Value::String(text) => match text.trim().parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::String(text),
        },
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 => Value::from(f as i64),
            _ => Value::Number(n),
        },
        other => other,
    }
}

fn coerce_boolean(value: Value) -> Value {
    match value {
        Value::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::GraphTool;
    use serde_json::json;

    #[test]
    fn test_array_from_json_string() {
        assert_eq!(
            coerce_array(json!("[\"LOCATED_IN\", \"PART_OF_SYSTEM\"]")),
            json!(["LOCATED_IN", "PART_OF_SYSTEM"])
        );
    }

    #[test]
    fn test_array_from_single_quoted_literal() {
        assert_eq!(coerce_array(json!("['LOCATED_IN']")), json!(["LOCATED_IN"]));
        assert_eq!(
            coerce_array(json!("[\"LOCATED_IN\", 'PART_OF_SYSTEM'")),
            json!(["LOCATED_IN", "PART_OF_SYSTEM"])
        );
    }

    #[test]
    fn test_array_passes_through_when_undecodable() {
        assert_eq!(coerce_array(json!("LOCATED_IN")), json!("LOCATED_IN"));
        assert_eq!(coerce_array(json!(["A"])), json!(["A"]));
        assert_eq!(coerce_array(json!(7)), json!(7));
    }

    #[test]
    fn test_object_from_json_string() {
        assert_eq!(
            coerce_object(json!("{\"current_only\": false}")),
            json!({"current_only": false})
        );
        assert_eq!(coerce_object(json!("not json")), json!("not json"));
    }

    #[test]
    fn test_coerce_arguments_uses_declared_types() {
        let definition = GraphTool::ContainerContentsListByName.definition();
        let coerced = coerce_arguments(
            &definition,
            json!({
                "name": "Hall 1",
                "relationship_types": "[\"LOCATED_IN\"]",
                "validity_filter": "{\"as_of_date\": \"2024-01-01\"}",
                "limit": "25"
            }),
        );
        assert_eq!(
            coerced,
            json!({
                "name": "Hall 1",
                "relationship_types": ["LOCATED_IN"],
                "validity_filter": {"as_of_date": "2024-01-01"},
                "limit": 25
            })
        );
    }

    #[test]
    fn test_string_parameters_are_untouched() {
        let definition = GraphTool::GetNodeByName.definition();
        let coerced = coerce_arguments(&definition, json!({"name": "['Hall 1']"}));
        assert_eq!(coerced, json!({"name": "['Hall 1']"}));
    }

    #[test]
    fn test_whole_object_sent_as_string() {
        let definition = GraphTool::ListCategories.definition();
        let coerced = coerce_arguments(&definition, json!("{\"include_hierarchy\": \"false\"}"));
        assert_eq!(coerced, json!({"include_hierarchy": false}));
        assert_eq!(coerce_arguments(&definition, Value::Null), json!({}));
    }

    #[test]
    fn test_coercion_with_debug_logging_enabled() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let definition = GraphTool::ContainerContentsCountByName.definition();
        let coerced = tracing::subscriber::with_default(subscriber, || {
            coerce_arguments(
                &definition,
                json!({"name": "Hall 1", "relationship_types": "['LOCATED_IN']"}),
            )
        });
        assert_eq!(
            coerced,
            json!({"name": "Hall 1", "relationship_types": ["LOCATED_IN"]})
        );
    }
}
