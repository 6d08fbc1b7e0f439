//! Transport abstractions and request/response types.
//!
//! This module defines the core abstractions for the two external text services:
//! one-shot generation ([`LlmClient`]) and stateful conversation
//! ([`ConversationClient`]).

use inquest_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// LLM completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRequest {
    /// The prompt text to send to the LLM
    pub prompt: String,

    /// Model identifier (e.g., "llama3.2")
    pub model: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature for sampling (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Top-p nucleus sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// System prompt (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

impl LlmRequest {
    /// Create a new LLM request with required fields.
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            system: None,
        }
    }

    /// Set the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set nucleus sampling.
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Set the system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// LLM completion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    /// The generated text
    pub content: String,

    /// Model that generated the response
    pub model: String,

    /// Usage statistics
    pub usage: LlmUsage,

    /// Whether the response was complete
    #[serde(default = "default_true")]
    pub done: bool,
}

fn default_true() -> bool {
    true
}

/// Token usage statistics.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LlmUsage {
    /// Tokens in the prompt
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens in the completion
    #[serde(default)]
    pub completion_tokens: u32,

    /// Total tokens used
    #[serde(default)]
    pub total_tokens: u32,
}

impl LlmUsage {
    /// Create usage stats from prompt and completion token counts.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Trait for text-generation providers.
///
/// This trait abstracts the underlying provider and exposes a single
/// non-streaming completion call.
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Get the provider name (e.g., "ollama").
    fn provider_name(&self) -> &str;

    /// Perform a non-streaming completion.
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse>;
}

/// One message sent to a conversational knowledge service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    /// Question text
    pub content: String,

    /// Remote conversation handle
    pub session_id: String,

    /// Ask the service to discard prior turns tied to `session_id`
    pub reset_context: bool,

    /// Role framing sent alongside the question
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
}

/// Trait for stateful conversational services.
///
/// Implementations must report 401/403-equivalent rejections as
/// [`AppError::Unauthorized`].
#[async_trait::async_trait]
pub trait ConversationClient: Send + Sync {
    /// Get the provider name.
    fn provider_name(&self) -> &str;

    /// Send one message and return the service's reply text.
    async fn send(&self, message: &ConversationMessage) -> AppResult<String>;
}

/// Map a non-success HTTP status to the error taxonomy.
///
/// 401 and 403 become [`AppError::Unauthorized`]; everything else is a
/// transport error carrying the status.
pub fn error_for_status(provider: &str, status: u16, body: &str) -> AppError {
    let body = body.trim();
    let detail = if body.is_empty() { "no response body" } else { body };
    match status {
        401 | 403 => AppError::Unauthorized(format!("{} rejected credentials: {}", provider, detail)),
        _ => AppError::transport_status(status, format!("{} API error: {}", provider, detail)),
    }
}
