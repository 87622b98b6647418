//! decant - Anthropic Messages API response conversion
//!
//! Converts raw HTTP responses from the Anthropic Messages API into a
//! normalized result representation. Single-shot JSON bodies become text or
//! tool-call results; streaming (SSE) bodies become a lazy stream of output
//! chunks in which text fragments are forwarded immediately while tool-call
//! argument fragments are reassembled into complete, typed tool calls before
//! they surface.

pub mod client;
pub mod error;
pub mod events;
pub mod parser;
pub mod reassembler;
pub mod response;
pub mod sse;
pub mod types;

pub use client::{AnthropicClient, AnthropicConfig, Message, MessageRequest, Role};
pub use error::{ConvertError, Result};
pub use events::{ContentBlockInfo, Delta, StreamEvent};
pub use parser::parse_message;
pub use reassembler::{Reassembler, reassemble};
pub use response::convert;
pub use types::{ChunkStream, ConvertOptions, LlmResult, OutputChunk, ToolCall};
