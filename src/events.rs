//! Wire-level streaming event types for the Anthropic Messages API.
//!
//! Streamed responses arrive as SSE frames whose `data:` payloads decode into
//! these tagged records. Only the events the reassembler acts on are modeled;
//! everything else (message_start, message_delta, ping, future additions)
//! collapses into [`StreamEvent::Other`] and is ignored downstream.

use serde::{Deserialize, Serialize};

/// Events received during streaming from the Anthropic API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A new content block opened (text or tool_use)
    ContentBlockStart {
        /// Index of the content block within the message
        #[serde(default)]
        index: u32,
        /// The opening block's metadata
        content_block: ContentBlockInfo,
    },
    /// An incremental update to the currently open content block
    ContentBlockDelta {
        /// Index of the content block within the message
        #[serde(default)]
        index: u32,
        /// The fragment carried by this event
        delta: Delta,
    },
    /// The currently open content block closed
    ContentBlockStop {
        /// Index of the content block within the message
        #[serde(default)]
        index: u32,
    },
    /// Message complete
    MessageStop,
    /// Any event kind this library does not act on
    #[serde(other)]
    Other,
}

/// Metadata carried by a `content_block_start` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlockInfo {
    /// A plain text block; its body arrives via text deltas
    Text {
        #[serde(default)]
        text: String,
    },
    /// A tool invocation block; its arguments arrive via input_json deltas
    ToolUse { id: String, name: String },
    /// Unrecognized block kinds (thinking, future additions)
    #[serde(other)]
    Other,
}

/// The payload of a `content_block_delta` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Delta {
    /// A fragment of text belonging to the open text block
    TextDelta { text: String },
    /// A fragment of the open tool call's argument JSON
    InputJsonDelta {
        #[serde(default)]
        partial_json: String,
    },
    /// Unrecognized delta kinds
    #[serde(other)]
    Other,
}
