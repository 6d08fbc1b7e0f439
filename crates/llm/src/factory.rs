//! Transport provider factory.
//!
//! This module creates transport clients from configuration values. Unknown
//! providers and missing credentials are reported as configuration errors so
//! they surface before a run starts.

use crate::client::{ConversationClient, LlmClient};
use crate::providers::{HttpConversationClient, OllamaClient};
use inquest_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Provider type enum for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Ollama,
}

impl ProviderType {
    /// Parse provider type from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            _ => None,
        }
    }

    /// Get the canonical provider name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
        }
    }
}

/// Create a text-generation client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama")
/// * `endpoint` - Optional custom endpoint URL
/// * `timeout` - Optional request timeout
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    timeout: Option<Duration>,
) -> AppResult<Arc<dyn LlmClient>> {
    match ProviderType::parse(provider) {
        Some(ProviderType::Ollama) => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = match timeout {
                Some(timeout) => OllamaClient::with_timeout(base_url, timeout),
                None => OllamaClient::with_base_url(base_url),
            };
            Ok(Arc::new(client))
        }
        None => Err(AppError::Config(format!("Unknown provider: {}", provider))),
    }
}

/// Create a conversational client for the direct answer source.
///
/// # Errors
/// Returns `AppError::Config` if the endpoint or credential is missing.
pub fn create_conversation_client(
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn ConversationClient>> {
    let endpoint = endpoint
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| AppError::Config("Conversation endpoint is required".to_string()))?;
    let api_key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| AppError::Config("Conversation service requires an API key".to_string()))?;

    Ok(Arc::new(HttpConversationClient::new(endpoint, api_key)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_parsing() {
        assert_eq!(ProviderType::parse("ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("Ollama"), Some(ProviderType::Ollama));
        assert_eq!(ProviderType::parse("unknown"), None);
        assert_eq!(ProviderType::Ollama.as_str(), "ollama");
    }

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", None, None).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let client = create_client(
            "ollama",
            Some("http://localhost:8080"),
            Some(Duration::from_secs(5)),
        );
        assert!(client.is_ok());
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", None, None) {
            Err(AppError::Config(msg)) => assert!(msg.contains("Unknown provider")),
            _ => panic!("Expected config error for unknown provider"),
        }
    }

    #[test]
    fn test_conversation_client_requires_credentials() {
        assert!(matches!(
            create_conversation_client(Some("https://kb.example.com"), None),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            create_conversation_client(None, Some("secret")),
            Err(AppError::Config(_))
        ));
        assert!(create_conversation_client(Some("https://kb.example.com"), Some("secret")).is_ok());
    }
}
