//! OpenAI-compatible completion client.
//!
//! Implements [`CompletionClient`] for the Chat Completions wire format.
//! Groq, OpenAI, Ollama, vLLM and Together AI all accept it, so the endpoint
//! is just a URL.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::BoxFuture;

use super::provider::{CompletionClient, LlmError};
use super::types::CompletionRequest;

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Default `retry-after` when a 429 carries no usable header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// OpenAI-compatible client.
pub struct OpenAiCompatClient {
    client: Client,
    api_key: Zeroizing<String>,
    base_url: String,
    timeout: Option<Duration>,
}

impl OpenAiCompatClient {
    /// Create a new client with the given API key, pointed at Groq.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Zeroizing::new(api_key.into()),
            base_url: GROQ_API_URL.to_string(),
            timeout: None,
        }
    }

    /// Set a custom endpoint URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set a transport-level timeout for each request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Create a client from the `[llm]` config section.
    pub fn from_config(
        config: &bedside_config::LlmConfig,
    ) -> Result<Self, bedside_config::ConfigError> {
        let api_key = config.api_key()?;
        Ok(Self::new(api_key)
            .with_base_url(&config.base_url)
            .with_timeout(config.timeout()))
    }

    /// Convert our request into the API format.
    fn build_request_body(&self, request: &CompletionRequest) -> ApiRequest {
        ApiRequest {
            model: request.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| ApiMessage {
                    role: m.role.wire_name().to_string(),
                    content: Some(m.content.clone()),
                })
                .collect(),
            max_tokens: Some(request.max_tokens),
            temperature: Some(request.temperature),
        }
    }

    /// Extract the reply text from a decoded response.
    fn parse_response(&self, resp: ApiResponse) -> Result<String, LlmError> {
        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::MalformedResponse("no choices in response".to_string()))?;

        match choice.message.content {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(LlmError::MalformedResponse(
                "first choice has no text content".to_string(),
            )),
        }
    }
}

impl fmt::Debug for OpenAiCompatClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiCompatClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CompletionClient for OpenAiCompatClient {
    fn name(&self) -> &str {
        "OpenAI-compatible"
    }

    fn complete(&self, request: &CompletionRequest) -> BoxFuture<'_, Result<String, LlmError>> {
        let body = self.build_request_body(request);
        Box::pin(async move {
            debug!(
                model = %body.model,
                messages = body.messages.len(),
                "chat completion request"
            );

            let mut builder = self
                .client
                .post(&self.base_url)
                .header("authorization", format!("Bearer {}", self.api_key.as_str()))
                .header("content-type", "application/json")
                .json(&body);
            if let Some(timeout) = self.timeout {
                builder = builder.timeout(timeout);
            }

            let resp = builder.send().await.map_err(transport_error)?;

            let status = resp.status().as_u16();
            if status == 401 || status == 403 {
                let detail = resp.text().await.unwrap_or_default();
                return Err(LlmError::Auth(if detail.is_empty() {
                    "invalid API key".to_string()
                } else {
                    detail
                }));
            }
            if status == 429 {
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                return Err(LlmError::RateLimited {
                    retry_after_secs: retry_after,
                });
            }
            if !resp.status().is_success() {
                let error_body = resp.text().await.unwrap_or_default();
                return Err(LlmError::Network(format!(
                    "provider returned {status}: {error_body}"
                )));
            }

            let text = resp.text().await.map_err(transport_error)?;
            let api_resp: ApiResponse = serde_json::from_str(&text)
                .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

            self.parse_response(api_resp)
        })
    }
}

fn transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Network(e.to_string())
    }
}

// ── Wire types (private) ────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}
