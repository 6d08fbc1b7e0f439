//! Embedding generation for ingestion and retrieval.
//!
//! [`Embedder`] splits work into batches of the configured size and fails the
//! whole call on the first failing batch, naming that batch in the error.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::EmbeddingConfig;
pub use provider::{create_provider, EmbeddingProvider};

use crate::chunk::Chunk;
use inquest_core::{AppError, AppResult};
use std::sync::Arc;

/// Batched embedding front end over a provider.
#[derive(Debug, Clone)]
pub struct Embedder {
    provider: Arc<dyn EmbeddingProvider>,
    batch_size: usize,
}

impl Embedder {
    /// Wrap a provider. A batch size of zero is a configuration error.
    pub fn new(provider: Arc<dyn EmbeddingProvider>, batch_size: usize) -> AppResult<Self> {
        if batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            provider,
            batch_size,
        })
    }

    /// Build the provider described by `config` and wrap it.
    pub fn from_config(config: &EmbeddingConfig) -> AppResult<Self> {
        Self::new(create_provider(config)?, config.batch_size)
    }

    pub fn provider(&self) -> &dyn EmbeddingProvider {
        self.provider.as_ref()
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed texts in order.
    pub async fn embed_texts(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let batches = texts.len().div_ceil(self.batch_size);
        tracing::debug!(
            "Embedding {} texts in {} batches using provider '{}' (model: {})",
            texts.len(),
            batches,
            self.provider.provider_name(),
            self.provider.model_name()
        );

        let mut embeddings = Vec::with_capacity(texts.len());
        for (index, batch) in texts.chunks(self.batch_size).enumerate() {
            let vectors = self.provider.embed_batch(batch).await.map_err(|e| {
                AppError::Ingestion(format!(
                    "Embedding batch {}/{} failed: {}",
                    index + 1,
                    batches,
                    e
                ))
            })?;

            if vectors.len() != batch.len() {
                return Err(AppError::Ingestion(format!(
                    "Embedding batch {}/{} returned {} vectors for {} texts",
                    index + 1,
                    batches,
                    vectors.len(),
                    batch.len()
                )));
            }
            embeddings.extend(vectors);
        }

        Ok(embeddings)
    }

    /// Embed chunk texts in order.
    pub async fn embed_chunks(&self, chunks: &[Chunk]) -> AppResult<Vec<Vec<f32>>> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        self.embed_texts(&texts).await
    }

    /// Embed a single query.
    pub async fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        self.provider.embed(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails on the n-th batch (1-based) and counts calls.
    #[derive(Debug)]
    struct FlakyProvider {
        fail_on: usize,
        calls: AtomicUsize,
        short: bool,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for FlakyProvider {
        fn provider_name(&self) -> &str {
            "flaky"
        }
        fn model_name(&self) -> &str {
            "flaky-v1"
        }
        fn dimensions(&self) -> usize {
            2
        }
        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                return Err(AppError::transport_status(500, "boom"));
            }
            let n = if self.short { texts.len() - 1 } else { texts.len() };
            Ok(vec![vec![1.0, 0.0]; n])
        }
    }

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {}", i)).collect()
    }

    #[test]
    fn test_zero_batch_size_is_config_error() {
        let result = Embedder::new(Arc::new(TrigramProvider::new(8)), 0);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[tokio::test]
    async fn test_batches_preserve_order_and_count() {
        let embedder = Embedder::new(Arc::new(TrigramProvider::new(32)), 2).unwrap();
        let inputs = texts(5);
        let vectors = embedder.embed_texts(&inputs).await.unwrap();
        assert_eq!(vectors.len(), 5);
        assert_eq!(vectors[4], embedder.embed_query("text 4").await.unwrap());
    }

    #[tokio::test]
    async fn test_failing_batch_aborts_with_its_index() {
        let provider = Arc::new(FlakyProvider {
            fail_on: 2,
            calls: AtomicUsize::new(0),
            short: false,
        });
        let embedder = Embedder::new(provider.clone(), 2).unwrap();

        let err = embedder.embed_texts(&texts(6)).await.unwrap_err();
        assert!(matches!(&err, AppError::Ingestion(msg) if msg.contains("batch 2/3")));
        // The third batch is never attempted
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_short_batch_is_rejected() {
        let provider = Arc::new(FlakyProvider {
            fail_on: 0,
            calls: AtomicUsize::new(0),
            short: true,
        });
        let embedder = Embedder::new(provider, 4).unwrap();
        let err = embedder.embed_texts(&texts(3)).await.unwrap_err();
        assert!(err.to_string().contains("returned 2 vectors for 3 texts"));
    }
}
