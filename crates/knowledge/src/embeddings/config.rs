//! Embedding configuration.

use inquest_core::config::EmbeddingSettings;
use inquest_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Embedding configuration for one ingestion pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "trigram" or "ollama"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Provider endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_batch_size() -> usize {
    32
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "trigram".to_string(),
            model: "trigram-v1".to_string(),
            dimensions: 384,
            batch_size: default_batch_size(),
            endpoint: None,
        }
    }
}

impl EmbeddingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> AppResult<()> {
        if self.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch_size must be at least 1".to_string(),
            ));
        }
        if self.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be at least 1".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(AppError::Config("Embedding model cannot be empty".to_string()));
        }
        Ok(())
    }
}

impl From<&EmbeddingSettings> for EmbeddingConfig {
    fn from(settings: &EmbeddingSettings) -> Self {
        Self {
            provider: settings.provider.clone(),
            model: settings.model.clone(),
            dimensions: settings.dimensions,
            batch_size: settings.batch_size,
            endpoint: settings.endpoint.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.provider, "trigram");
        assert_eq!(config.dimensions, 384);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_size_is_rejected() {
        let config = EmbeddingConfig {
            batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_from_settings() {
        let settings = EmbeddingSettings {
            provider: "ollama".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            batch_size: 8,
            endpoint: Some("http://gpu-box:11434".to_string()),
        };
        let config = EmbeddingConfig::from(&settings);
        assert_eq!(config.model, "nomic-embed-text");
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu-box:11434"));
    }
}
