//! Incremental Server-Sent Events decoding.
//!
//! The streaming API delivers events as SSE frames over the response body.
//! Network chunks arrive cut at arbitrary byte boundaries, so the decoder
//! buffers until it has complete lines and yields the `data:` payload of each
//! blank-line-terminated frame. `event:` names are redundant with the `type`
//! field inside the payload and are skipped, as are comments, `id:` and
//! `retry:` fields.

use std::mem;

use crate::events::StreamEvent;

/// Incremental SSE frame decoder. Feed it raw body chunks; collect completed
/// `data:` payloads.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: String,
    has_data: bool,
}

impl SseDecoder {
    /// Create a decoder with an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of the response body, returning the data payload of
    /// every frame this chunk completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        while let Some(newline) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let mut line = &line[..line.len() - 1];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            // Frames always end on a line boundary, so multi-byte characters
            // are never split here
            self.process_line(&String::from_utf8_lossy(line), &mut payloads);
        }
        payloads
    }

    fn process_line(&mut self, line: &str, payloads: &mut Vec<String>) {
        if line.is_empty() {
            if self.has_data {
                payloads.push(mem::take(&mut self.data));
                self.has_data = false;
            }
            return;
        }
        if line.starts_with(':') {
            return;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        if field == "data" {
            if self.has_data {
                self.data.push('\n');
            }
            self.data.push_str(value);
            self.has_data = true;
        }
    }
}

/// Decode one SSE data payload into a stream event.
///
/// Returns None for empty payloads, terminator sentinels, and payloads that do
/// not deserialize; the streaming path skips those rather than failing.
pub fn decode_event(data: &str) -> Option<StreamEvent> {
    if data.is_empty() || data == "[DONE]" {
        return None;
    }
    serde_json::from_str(data).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n");
        assert_eq!(payloads, vec!["{\"type\":\"message_stop\"}".to_string()]);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = SseDecoder::new();

        assert!(decoder.feed(b"data: {\"type\":\"mess").is_empty());
        assert!(decoder.feed(b"age_stop\"}\n").is_empty());
        let payloads = decoder.feed(b"\n");

        assert_eq!(payloads, vec!["{\"type\":\"message_stop\"}".to_string()]);
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: one\n\ndata: two\n\n");
        assert_eq!(payloads, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn test_multi_data_lines_join_with_newline() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: first\ndata: second\n\n");
        assert_eq!(payloads, vec!["first\nsecond".to_string()]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b"data: hello\r\n\r\n");
        assert_eq!(payloads, vec!["hello".to_string()]);
    }

    #[test]
    fn test_comments_and_other_fields_skipped() {
        let mut decoder = SseDecoder::new();
        let payloads = decoder.feed(b": keep-alive\nevent: ping\nid: 7\nretry: 100\ndata: x\n\n");
        assert_eq!(payloads, vec!["x".to_string()]);
    }

    #[test]
    fn test_blank_line_without_data_emits_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed(b"event: ping\n\n").is_empty());
        assert!(decoder.feed(b"\n\n\n").is_empty());
    }

    #[test]
    fn test_multibyte_text_survives_arbitrary_chunking() {
        let frame = "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"héllo ⚡\"}}\n\n";
        let bytes = frame.as_bytes();

        let mut decoder = SseDecoder::new();
        let mut payloads = Vec::new();
        // Feed one byte at a time, splitting every multi-byte character
        for byte in bytes {
            payloads.extend(decoder.feed(std::slice::from_ref(byte)));
        }

        assert_eq!(payloads.len(), 1);
        let event = decode_event(&payloads[0]).unwrap();
        assert!(matches!(
            event,
            StreamEvent::ContentBlockDelta { .. }
        ));
    }

    #[test]
    fn test_decode_event_valid() {
        let event = decode_event("{\"type\":\"message_stop\"}");
        assert_eq!(event, Some(StreamEvent::MessageStop));
    }

    #[test]
    fn test_decode_event_skips_garbage() {
        assert!(decode_event("").is_none());
        assert!(decode_event("[DONE]").is_none());
        assert!(decode_event("not json").is_none());
    }
}
