//! Response classifier: the entry point that turns a raw HTTP response into a
//! normalized result.
//!
//! Rate-limit rejections are surfaced before any body parsing. Streaming
//! responses become a lazy chunk stream over the SSE body; everything else is
//! fully decoded and handed to the one-shot parser.

use futures::{Stream, StreamExt, TryStreamExt, stream};
use reqwest::{Response, StatusCode};
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::events::StreamEvent;
use crate::parser;
use crate::reassembler;
use crate::sse::{self, SseDecoder};
use crate::types::{ConvertOptions, LlmResult};

/// Convert an API response according to its status and the `stream` option.
///
/// With `options.stream` set, nothing is read from the body until the caller
/// polls the returned stream; otherwise the body is materialized here.
pub async fn convert(response: Response, options: ConvertOptions) -> Result<LlmResult> {
    if response.status() == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<u64>().ok());
        return Err(ConvertError::RateLimitExceeded { retry_after });
    }

    if options.stream {
        debug!("classified response as streaming");
        let events = event_stream(response);
        return Ok(LlmResult::Stream(Box::pin(reassembler::reassemble(events))));
    }

    let body: serde_json::Value = response.json().await?;
    parser::parse_message(&body)
}

/// Decode the response body's SSE frames into stream events.
///
/// Undeserializable payloads are skipped; transport errors are forwarded.
fn event_stream(response: Response) -> impl Stream<Item = Result<StreamEvent>> {
    let mut decoder = SseDecoder::new();
    response
        .bytes_stream()
        .map_err(ConvertError::from)
        .map(move |chunk| {
            let events: Vec<Result<StreamEvent>> = match chunk {
                Ok(bytes) => decoder
                    .feed(&bytes)
                    .iter()
                    .filter_map(|payload| sse::decode_event(payload))
                    .map(Ok)
                    .collect(),
                Err(err) => vec![Err(err)],
            };
            stream::iter(events)
        })
        .flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::OutputChunk;
    use serde_json::json;

    fn response_with_body(status: u16, body: &str) -> Response {
        let http_response = http::Response::builder()
            .status(status)
            .body(body.to_string())
            .unwrap();
        Response::from(http_response)
    }

    #[tokio::test]
    async fn test_rate_limited_with_retry_after() {
        let http_response = http::Response::builder()
            .status(429)
            .header("retry-after", "30")
            .body(String::new())
            .unwrap();
        let response = Response::from(http_response);

        let err = convert(response, ConvertOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ConvertError::RateLimitExceeded {
                retry_after: Some(30)
            }
        ));
    }

    #[tokio::test]
    async fn test_rate_limited_without_retry_after() {
        let response = response_with_body(429, "");

        let err = convert(response, ConvertOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ConvertError::RateLimitExceeded { retry_after: None }
        ));
    }

    #[tokio::test]
    async fn test_rate_limited_with_unparsable_retry_after() {
        let http_response = http::Response::builder()
            .status(429)
            .header("retry-after", "soon")
            .body(String::new())
            .unwrap();
        let response = Response::from(http_response);

        let err = convert(response, ConvertOptions::default()).await.unwrap_err();
        assert!(matches!(
            err,
            ConvertError::RateLimitExceeded { retry_after: None }
        ));
    }

    #[tokio::test]
    async fn test_rate_limit_checked_before_stream_flag() {
        let response = response_with_body(429, "");
        let err = convert(response, ConvertOptions::streaming()).await.unwrap_err();
        assert!(matches!(err, ConvertError::RateLimitExceeded { .. }));
    }

    #[tokio::test]
    async fn test_non_streaming_text_body() {
        let body = json!({
            "content": [{ "type": "text", "text": "Hi!" }]
        });
        let response = response_with_body(200, &body.to_string());

        let result = convert(response, ConvertOptions::default()).await.unwrap();
        assert_eq!(result.into_text(), Some("Hi!".to_string()));
    }

    #[tokio::test]
    async fn test_non_streaming_tool_body() {
        let body = json!({
            "content": [
                { "type": "tool_use", "id": "toolu_1", "name": "bash", "input": {"command": "ls"} }
            ]
        });
        let response = response_with_body(200, &body.to_string());

        let result = convert(response, ConvertOptions::default()).await.unwrap();
        let calls = result.into_tool_calls().unwrap();
        assert_eq!(calls[0].name, "bash");
    }

    #[tokio::test]
    async fn test_non_streaming_error_envelope() {
        let body = json!({
            "type": "error",
            "error": { "type": "invalid_request_error", "message": "bad model" }
        });
        let response = response_with_body(200, &body.to_string());

        let err = convert(response, ConvertOptions::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "API Error [invalid_request_error]: \"bad model\"");
    }

    #[tokio::test]
    async fn test_streaming_path_end_to_end() {
        let sse_body = concat!(
            "event: message_start\n",
            "data: {\"type\":\"message_start\",\"message\":{\"id\":\"msg_1\"}}\n\n",
            "event: content_block_start\n",
            "data: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"text\",\"text\":\"\"}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"On it. \"}}\n\n",
            "event: content_block_stop\n",
            "data: {\"type\":\"content_block_stop\",\"index\":0}\n\n",
            "event: content_block_start\n",
            "data: {\"type\":\"content_block_start\",\"index\":1,\"content_block\":{\"type\":\"tool_use\",\"id\":\"toolu_1\",\"name\":\"read_file\",\"input\":{}}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"path\\\":\"}}\n\n",
            "event: content_block_delta\n",
            "data: {\"type\":\"content_block_delta\",\"index\":1,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"\\\"a.txt\\\"}\"}}\n\n",
            "event: content_block_stop\n",
            "data: {\"type\":\"content_block_stop\",\"index\":1}\n\n",
            "event: message_stop\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );

        // Deliver the body in small chunks to exercise frame reassembly
        let chunks: Vec<std::result::Result<Vec<u8>, std::io::Error>> = sse_body
            .as_bytes()
            .chunks(17)
            .map(|chunk| Ok(chunk.to_vec()))
            .collect();
        let body = reqwest::Body::wrap_stream(stream::iter(chunks));

        let http_response = http::Response::builder().status(200).body(body).unwrap();
        let response = Response::from(http_response);

        let result = convert(response, ConvertOptions::streaming()).await.unwrap();
        let output: Vec<_> = result.into_stream().unwrap().collect().await;
        let output: Result<Vec<_>> = output.into_iter().collect();
        let output = output.unwrap();

        assert_eq!(output.len(), 2);
        assert_eq!(output[0], OutputChunk::Text("On it. ".to_string()));
        match &output[1] {
            OutputChunk::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].id, "toolu_1");
                assert_eq!(calls[0].name, "read_file");
                assert_eq!(calls[0].input, json!({"path": "a.txt"}));
            }
            other => panic!("expected tool-call batch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_streaming_text_only_has_no_trailing_batch() {
        let sse_body = concat!(
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hello \"}}\n\n",
            "data: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"world\"}}\n\n",
            "data: {\"type\":\"message_stop\"}\n\n",
        );
        let response = response_with_body(200, sse_body);

        let result = convert(response, ConvertOptions::streaming()).await.unwrap();
        let output: Vec<_> = result.into_stream().unwrap().collect().await;
        let output: Result<Vec<_>> = output.into_iter().collect();
        let output = output.unwrap();

        assert_eq!(
            output,
            vec![
                OutputChunk::Text("Hello ".to_string()),
                OutputChunk::Text("world".to_string()),
            ]
        );
    }
}
