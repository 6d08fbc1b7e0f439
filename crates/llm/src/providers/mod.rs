//! Transport provider implementations.

pub mod conversation;
pub mod ollama;

pub use conversation::HttpConversationClient;
pub use ollama::OllamaClient;
