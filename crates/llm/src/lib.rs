//! Transport crate for Inquest.
//!
//! This crate provides the two external text services the interrogation engine
//! talks to, each behind a provider-agnostic trait:
//!
//! - [`LlmClient`]: one-shot text generation, used for question generation,
//!   answer analysis and retrieval-mode answer synthesis.
//! - [`ConversationClient`]: a stateful conversational knowledge service, used
//!   by the direct answer source.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default text generator)
//! - **HTTP conversation**: JSON endpoint with bearer credentials
//!
//! # Example
//! ```no_run
//! use inquest_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{
    error_for_status, ConversationClient, ConversationMessage, LlmClient, LlmRequest,
    LlmResponse, LlmUsage,
};
pub use factory::{create_client, create_conversation_client, ProviderType};
pub use providers::{HttpConversationClient, OllamaClient};
