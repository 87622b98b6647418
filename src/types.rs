//! Normalized result types produced by response conversion.

use std::fmt;
use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// A unit of streamed output: a text fragment, or the batch of tool calls
/// accumulated over the message
#[derive(Debug, Clone, PartialEq)]
pub enum OutputChunk {
    Text(String),
    ToolCalls(Vec<ToolCall>),
}

impl OutputChunk {
    /// The text fragment, if this is a text chunk
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutputChunk::Text(text) => Some(text),
            OutputChunk::ToolCalls(_) => None,
        }
    }
}

/// A lazy sequence of output chunks, produced only as the underlying event
/// source yields
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<OutputChunk>> + Send>>;

/// The normalized outcome of converting one API response
pub enum LlmResult {
    /// Plain text reply
    Text(String),
    /// One or more tool calls, in the order the model emitted them
    ToolCalls(Vec<ToolCall>),
    /// Streamed reply; chunks arrive as the network delivers events
    Stream(ChunkStream),
}

impl LlmResult {
    /// The reply text, if this is a text result
    pub fn into_text(self) -> Option<String> {
        match self {
            LlmResult::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The tool calls, if this is a tool-call result
    pub fn into_tool_calls(self) -> Option<Vec<ToolCall>> {
        match self {
            LlmResult::ToolCalls(calls) => Some(calls),
            _ => None,
        }
    }

    /// The chunk stream, if this is a streaming result
    pub fn into_stream(self) -> Option<ChunkStream> {
        match self {
            LlmResult::Stream(stream) => Some(stream),
            _ => None,
        }
    }
}

// Manual impl since the boxed stream is not Debug
impl fmt::Debug for LlmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmResult::Text(text) => f.debug_tuple("Text").field(text).finish(),
            LlmResult::ToolCalls(calls) => f.debug_tuple("ToolCalls").field(calls).finish(),
            LlmResult::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Options recognized by the response classifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Treat the response body as an SSE event stream
    pub stream: bool,
}

impl ConvertOptions {
    /// Options for the streaming path
    pub fn streaming() -> Self {
        Self { stream: true }
    }
}
