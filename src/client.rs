//! Anthropic API client.
//!
//! A thin wrapper over reqwest that builds Messages API requests, sends them,
//! and hands the raw response to the classifier. Retry and backoff policy is
//! deliberately the caller's job; rate limits surface as typed errors.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{ConvertError, Result};
use crate::response;
use crate::types::{ConvertOptions, LlmResult};

/// Anthropic API base URL
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic API version
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Default model to use
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default max tokens
const DEFAULT_MAX_TOKENS: u32 = 8192;

/// Environment variable holding the API key
const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// Configuration for the Anthropic client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub base_url: String,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(300),
            base_url: ANTHROPIC_BASE_URL.to_string(),
        }
    }
}

impl AnthropicConfig {
    /// Create a new config with a specific model
    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Everything needed for one Messages API call
#[derive(Debug, Clone, Default)]
pub struct MessageRequest {
    pub system: String,
    pub messages: Vec<Message>,
    /// Tool schemas in the API's wire format (name/description/input_schema)
    pub tools: Vec<Value>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
}

impl MessageRequest {
    /// Create a new request with a system prompt
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            ..Default::default()
        }
    }

    /// Add a message to the request
    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    /// Add a user message
    pub fn with_user_message(self, content: impl Into<String>) -> Self {
        self.with_message(Message::user(content))
    }

    /// Add tool schemas to the request
    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Build the request body for the Messages API
    fn to_body(&self, config: &AnthropicConfig, stream: bool) -> Value {
        let model = self.model.as_ref().unwrap_or(&config.model);
        let max_tokens = self.max_tokens.unwrap_or(config.max_tokens);

        let mut body = json!({
            "model": model,
            "max_tokens": max_tokens,
            "messages": self.messages,
        });

        if !self.system.is_empty() {
            body["system"] = json!(self.system);
        }
        if !self.tools.is_empty() {
            body["tools"] = json!(self.tools);
        }
        if stream {
            body["stream"] = json!(true);
        }

        body
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    config: AnthropicConfig,
}

impl AnthropicClient {
    /// Create a new client, reading ANTHROPIC_API_KEY from the environment
    pub fn new(config: AnthropicConfig) -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| ConvertError::MissingApiKey(API_KEY_ENV.to_string()))?;
        Self::with_api_key(api_key, config)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: AnthropicConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            api_key,
            config,
        })
    }

    /// The model this client sends requests for
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Whether the client holds a usable API key
    pub fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Send a request and convert the fully materialized response.
    ///
    /// Returns a text or tool-call result, never a stream.
    pub async fn complete(&self, request: &MessageRequest) -> Result<LlmResult> {
        let response = self.send(request, false).await?;
        response::convert(response, ConvertOptions::default()).await
    }

    /// Send a request with streaming enabled.
    ///
    /// Returns a streaming result whose chunks arrive as the API delivers
    /// events; nothing is consumed until the stream is polled.
    pub async fn stream(&self, request: &MessageRequest) -> Result<LlmResult> {
        let response = self.send(request, true).await?;
        response::convert(response, ConvertOptions::streaming()).await
    }

    async fn send(&self, request: &MessageRequest, stream: bool) -> Result<reqwest::Response> {
        let body = request.to_body(&self.config, stream);
        let url = format!("{}/v1/messages", self.config.base_url);
        debug!(%url, stream, "sending messages request");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        Ok(response)
    }
}

// Manual impl so the API key never appears in logs
impl fmt::Debug for AnthropicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicClient")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}
