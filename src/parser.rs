//! One-shot parser for non-streaming response bodies.

use serde_json::Value;
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::types::{LlmResult, ToolCall};

/// Parse a fully decoded Messages API body into a normalized result.
///
/// Tool calls take priority: if any `tool_use` block is present the result is
/// the ordered batch of tool calls and accompanying text is discarded.
pub fn parse_message(body: &Value) -> Result<LlmResult> {
    if body.get("type").and_then(Value::as_str) == Some("error") {
        return Err(upstream_error(body));
    }

    let blocks = body
        .get("content")
        .and_then(Value::as_array)
        .filter(|blocks| !blocks.is_empty())
        .ok_or(ConvertError::EmptyContent)?;

    let tool_calls: Vec<ToolCall> = blocks
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("tool_use"))
        .filter_map(parse_tool_use_block)
        .collect();

    if !tool_calls.is_empty() {
        debug!(count = tool_calls.len(), "parsed tool-call response");
        return Ok(LlmResult::ToolCalls(tool_calls));
    }

    match blocks[0].get("text").and_then(Value::as_str) {
        Some(text) => Ok(LlmResult::Text(text.to_string())),
        None => Err(ConvertError::UnparsableContent),
    }
}

/// Build the error for an API-reported error envelope.
fn upstream_error(body: &Value) -> ConvertError {
    let error = body.get("error");
    let kind = error
        .and_then(|e| e.get("type"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("An unknown error occurred.");
    ConvertError::Upstream {
        kind: kind.to_string(),
        message: message.to_string(),
    }
}

/// Read a single tool_use content block; blocks missing id or name are skipped.
fn parse_tool_use_block(block: &Value) -> Option<ToolCall> {
    let id = block.get("id").and_then(Value::as_str)?;
    let name = block.get("name").and_then(Value::as_str)?;
    let input = block
        .get("input")
        .cloned()
        .unwrap_or(Value::Object(Default::default()));
    Some(ToolCall::new(id, name, input))
}
