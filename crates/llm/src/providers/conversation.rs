//! HTTP conversational knowledge service provider.
//!
//! The service keeps conversational state per `sessionId`. Requests are JSON
//! posts with a bearer credential; the reply text is read from the first of
//! `reply`, `answer`, `content` or `message` present in the response body, or the
//! raw body when it is not JSON.

use crate::client::{error_for_status, ConversationClient, ConversationMessage};
use inquest_core::{AppError, AppResult};
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Response shapes accepted from the service.
#[derive(Debug, Deserialize)]
struct ConversationReply {
    reply: Option<String>,
    answer: Option<String>,
    content: Option<String>,
    message: Option<String>,
}

impl ConversationReply {
    fn into_text(self) -> Option<String> {
        self.reply.or(self.answer).or(self.content).or(self.message)
    }
}

/// Conversational client speaking JSON over HTTP.
pub struct HttpConversationClient {
    endpoint: String,
    api_key: String,
    client: reqwest::Client,
}

impl HttpConversationClient {
    /// Create a client for `endpoint` authenticated with `api_key`.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            client,
        }
    }

    fn parse_reply(body: &str) -> AppResult<String> {
        match serde_json::from_str::<ConversationReply>(body) {
            Ok(reply) => reply.into_text().ok_or_else(|| {
                AppError::transport("Conversation service returned no reply field")
            }),
            Err(_) if !body.trim().is_empty() => Ok(body.trim().to_string()),
            Err(_) => Err(AppError::transport("Conversation service returned an empty body")),
        }
    }
}

#[async_trait::async_trait]
impl ConversationClient for HttpConversationClient {
    fn provider_name(&self) -> &str {
        "http-conversation"
    }

    #[instrument(skip(self, message), fields(session_id = %message.session_id, reset = message.reset_context))]
    async fn send(&self, message: &ConversationMessage) -> AppResult<String> {
        tracing::debug!("Sending message to conversation service");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .map_err(|e| {
                AppError::transport(format!("Failed to reach conversation service: {}", e))
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::transport_status(status, format!("Failed to read reply: {}", e)))?;

        if !(200..300).contains(&status) {
            return Err(error_for_status("Conversation service", status, &body));
        }

        Self::parse_reply(&body)
    }
}
