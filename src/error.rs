//! Error types for decant
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur while converting an API response
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The API returned 429 before any body was read
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimitExceeded { retry_after: Option<u64> },

    /// The API returned an error envelope instead of a message
    #[error("API Error [{kind}]: \"{message}\"")]
    Upstream { kind: String, message: String },

    /// The response body carried no content blocks
    #[error("Response does not contain any content.")]
    EmptyContent,

    /// Content blocks were present but held neither text nor tool calls
    #[error("Response content does not contain any text nor tool calls.")]
    UnparsableContent,

    /// A streamed tool call finished with arguments that are not valid JSON
    #[error("Malformed arguments for tool '{name}': {source}")]
    MalformedToolArguments {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// Missing API key environment variable
    #[error("Missing API key: environment variable {0} not set")]
    MissingApiKey(String),

    /// Network/transport error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for conversion operations
pub type Result<T> = std::result::Result<T, ConvertError>;
