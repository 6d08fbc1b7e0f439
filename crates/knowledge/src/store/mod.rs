//! Vector store abstraction.
//!
//! A [`VectorStore`] hands out named collections ([`VectorIndex`]). An index
//! embeds chunks itself through the [`Embedder`] it was created with, so callers
//! only ever pass text.

mod memory;
#[cfg(feature = "lancedb")]
mod lancedb;

pub use memory::InMemoryStore;
#[cfg(feature = "lancedb")]
pub use self::lancedb::LanceDbStore;

use crate::chunk::Chunk;
use crate::embeddings::Embedder;
use inquest_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

pub use inquest_core::config::KNOWN_STORES;

/// A chunk returned by similarity search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// A named collection of embedded chunks.
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Collection name.
    fn name(&self) -> &str;

    /// Embed and add chunks.
    async fn add(&self, chunks: &[Chunk]) -> AppResult<usize>;

    /// Top-`k` chunks by descending similarity, dropping those below
    /// `min_similarity` when given.
    async fn search(
        &self,
        query: &str,
        k: usize,
        min_similarity: Option<f32>,
    ) -> AppResult<Vec<ScoredChunk>>;

    /// Remove every chunk while keeping the collection.
    async fn clear(&self) -> AppResult<()>;

    /// Number of stored chunks.
    async fn count(&self) -> AppResult<usize>;
}

/// Factory for named collections.
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Open the collection `name`, creating it if needed.
    async fn create_or_connect(&self, name: &str) -> AppResult<Arc<dyn VectorIndex>>;
}

/// Build the store backend named `kind`.
///
/// `lancedb` persists under `data_dir` and is only available when the crate
/// is built with the `lancedb` feature.
pub fn create_store(
    kind: &str,
    data_dir: &Path,
    embedder: Arc<Embedder>,
) -> AppResult<Arc<dyn VectorStore>> {
    match kind {
        "memory" => Ok(Arc::new(InMemoryStore::new(embedder))),
        #[cfg(feature = "lancedb")]
        "lancedb" => Ok(Arc::new(LanceDbStore::new(data_dir, embedder))),
        #[cfg(not(feature = "lancedb"))]
        "lancedb" => {
            let _ = data_dir;
            Err(AppError::Config(
                "The lancedb store requires building with the `lancedb` feature".to_string(),
            ))
        }
        other => Err(AppError::Config(format!(
            "Unknown vector store: {}. Supported: {}",
            other,
            KNOWN_STORES.join(", ")
        ))),
    }
}

/// Calculate cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Sort by descending score, apply the threshold and keep the top `k`.
pub(crate) fn rank(mut scored: Vec<ScoredChunk>, k: usize, min_similarity: Option<f32>) -> Vec<ScoredChunk> {
    if let Some(threshold) = min_similarity {
        scored.retain(|s| s.score >= threshold);
    }
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}
