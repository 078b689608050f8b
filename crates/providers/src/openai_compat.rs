//! OpenAI-compatible completion client.
//!
//! Works with any endpoint exposing `POST {base_url}/chat/completions`,
//! including the Hugging Face router. One non-streaming request per call.

use async_trait::async_trait;
use folio_core::error::ProviderError;
use folio_core::message::{Message, Role};
use folio_core::provider::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Serialized request bodies above this size are refused locally.
pub const MAX_PAYLOAD_BYTES: usize = 50_000;

const USER_AGENT: &str = concat!("folio/", env!("CARGO_PKG_VERSION"));

/// An OpenAI-compatible LLM provider.
pub struct OpenAiCompatProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Create a provider with a 30 second transport timeout.
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        Self::with_timeout(name, base_url, api_key, Duration::from_secs(30))
    }

    /// Create a provider whose HTTP client gives up after `timeout`.
    pub fn with_timeout(
        name: impl Into<String>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Create a Hugging Face router provider (convenience constructor).
    pub fn huggingface(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("huggingface", base_url, api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn to_api_messages(messages: &[Message]) -> Vec<ApiMessage<'_>> {
        messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str(),
                content: &m.content,
            })
            .collect()
    }

    fn encode_body(request: &ProviderRequest) -> Result<Vec<u8>, ProviderError> {
        let body = ApiRequest {
            messages: Self::to_api_messages(&request.messages),
            model: &request.model,
            stream: false,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };
        let bytes = serde_json::to_vec(&body)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to encode request: {e}")))?;

        if bytes.len() > MAX_PAYLOAD_BYTES {
            return Err(ProviderError::PayloadTooLarge {
                size: bytes.len(),
                limit: MAX_PAYLOAD_BYTES,
            });
        }
        Ok(bytes)
    }
}

#[async_trait]
impl folio_core::Provider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = Self::encode_body(&request)?;

        debug!(
            provider = %self.name,
            model = %request.model,
            bytes = body.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let message = parse_error_message(&error_body);
            warn!(status = status.as_u16(), message = %message, "Provider returned error");
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message,
            });
        }

        let text = response.text().await.map_err(transport_error)?;
        let api_response: ApiResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("No content in response".into()))?;

        let usage = api_response.usage.map(|u| Usage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(ProviderResponse {
            message: Message {
                role: Role::Assistant,
                content,
            },
            usage,
            model: api_response.model.unwrap_or(request.model),
        })
    }
}

fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Pull `error.message` (or a string `error`) out of an error body, falling
/// back to the raw text.
pub fn parse_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.pointer("/error/message")
            .or_else(|| v.get("error"))
            .and_then(serde_json::Value::as_str)
    });

    match from_json {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => "empty error body".to_string(),
        None => body.trim().to_string(),
    }
}

// --- OpenAI API types (internal) ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    messages: Vec<ApiMessage<'a>>,
    model: &'a str,
    stream: bool,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ApiChoice>,
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
