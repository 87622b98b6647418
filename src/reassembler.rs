//! Event-stream reassembler.
//!
//! Consumes streaming events one at a time, in arrival order, and produces
//! output chunks: text fragments are forwarded the moment they arrive, while
//! tool-call argument fragments are buffered per tool call and only surfaced
//! as a single batch once the message completes. Partial argument buffers are
//! never parsed; a buffer becomes JSON exactly once, at `content_block_stop`.

use std::mem;

use futures::{Stream, StreamExt, future, stream};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{ConvertError, Result};
use crate::events::{ContentBlockInfo, Delta, StreamEvent};
use crate::types::{OutputChunk, ToolCall};

/// Transient accumulator for one in-flight tool call.
///
/// Exists only between a tool_use `content_block_start` and its matching
/// `content_block_stop`. The protocol closes each content block before
/// opening the next, so at most one is alive at a time.
#[derive(Debug)]
struct PendingToolCall {
    id: String,
    name: String,
    buffer: String,
}

/// State machine that rebuilds complete tool calls from streamed fragments.
///
/// Each conversion owns a fresh instance; nothing is shared across calls.
#[derive(Debug, Default)]
pub struct Reassembler {
    pending: Option<PendingToolCall>,
    batch: Vec<ToolCall>,
}

impl Reassembler {
    /// Create a reassembler with empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process one event, returning the chunks it produced (possibly none).
    ///
    /// Events the state machine does not act on are silently ignored, which
    /// keeps the stream tolerant of event kinds introduced after this was
    /// written.
    pub fn process_event(&mut self, event: StreamEvent) -> Result<Vec<OutputChunk>> {
        match event {
            StreamEvent::ContentBlockDelta {
                delta: Delta::TextDelta { text },
                ..
            } => Ok(vec![OutputChunk::Text(text)]),

            StreamEvent::ContentBlockStart {
                content_block: ContentBlockInfo::ToolUse { id, name },
                ..
            } => {
                if let Some(previous) = self.pending.take() {
                    // Well-formed streams close a block before opening the
                    // next; tolerate violations but leave a trace.
                    warn!(
                        dropped = %previous.id,
                        "tool_use block opened while another was still pending"
                    );
                }
                self.pending = Some(PendingToolCall {
                    id,
                    name,
                    buffer: String::new(),
                });
                Ok(Vec::new())
            }

            StreamEvent::ContentBlockDelta {
                delta: Delta::InputJsonDelta { partial_json },
                ..
            } => {
                if let Some(pending) = &mut self.pending {
                    pending.buffer.push_str(&partial_json);
                }
                Ok(Vec::new())
            }

            StreamEvent::ContentBlockStop { .. } => {
                // No pending call means a text block just closed; nothing to do.
                if let Some(pending) = self.pending.take() {
                    let input = parse_arguments(&pending)?;
                    debug!(id = %pending.id, name = %pending.name, "completed tool call");
                    self.batch.push(ToolCall::new(pending.id, pending.name, input));
                }
                Ok(Vec::new())
            }

            StreamEvent::MessageStop => {
                if self.batch.is_empty() {
                    Ok(Vec::new())
                } else {
                    Ok(vec![OutputChunk::ToolCalls(mem::take(&mut self.batch))])
                }
            }

            _ => Ok(Vec::new()),
        }
    }

    /// Drive a complete event sequence through a fresh reassembler.
    pub fn run<I>(events: I) -> Result<Vec<OutputChunk>>
    where
        I: IntoIterator<Item = StreamEvent>,
    {
        let mut reassembler = Self::new();
        let mut chunks = Vec::new();
        for event in events {
            chunks.extend(reassembler.process_event(event)?);
        }
        Ok(chunks)
    }
}

/// Parse a completed argument buffer. An empty buffer means the tool takes no
/// arguments and becomes an empty object.
fn parse_arguments(pending: &PendingToolCall) -> Result<Value> {
    if pending.buffer.is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(&pending.buffer).map_err(|source| ConvertError::MalformedToolArguments {
        name: pending.name.clone(),
        source,
    })
}

/// Adapt an async event stream into a lazy stream of output chunks.
///
/// Pull-based: an event is consumed from `events` only when the caller polls
/// for the next chunk, and chunks come out in the order the state machine
/// produced them. The first error ends the stream after it is yielded.
pub fn reassemble<S>(events: S) -> impl Stream<Item = Result<OutputChunk>>
where
    S: Stream<Item = Result<StreamEvent>>,
{
    events
        .scan(Some(Reassembler::new()), |state, event| {
            let step = match state.as_mut() {
                Some(reassembler) => match event.and_then(|e| reassembler.process_event(e)) {
                    Ok(chunks) => chunks.into_iter().map(Ok).collect(),
                    Err(err) => {
                        *state = None;
                        vec![Err(err)]
                    }
                },
                None => return future::ready(None),
            };
            future::ready(Some(step))
        })
        .flat_map(stream::iter)
}
