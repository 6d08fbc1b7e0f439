//! In-process vector store.

use super::{cosine_similarity, rank, ScoredChunk, VectorIndex, VectorStore};
use crate::chunk::Chunk;
use crate::embeddings::Embedder;
use inquest_core::{AppError, AppResult};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Collections held in memory for the life of the process.
pub struct InMemoryStore {
    embedder: Arc<Embedder>,
    collections: Mutex<HashMap<String, Arc<InMemoryIndex>>>,
}

impl InMemoryStore {
    pub fn new(embedder: Arc<Embedder>) -> Self {
        Self {
            embedder,
            collections: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait::async_trait]
impl VectorStore for InMemoryStore {
    async fn create_or_connect(&self, name: &str) -> AppResult<Arc<dyn VectorIndex>> {
        let mut collections = self
            .collections
            .lock()
            .map_err(|_| AppError::Other("Vector store lock poisoned".to_string()))?;

        let index = collections
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating in-memory collection '{}'", name);
                Arc::new(InMemoryIndex {
                    name: name.to_string(),
                    embedder: Arc::clone(&self.embedder),
                    entries: RwLock::new(Vec::new()),
                })
            })
            .clone();

        Ok(index)
    }
}

struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// One in-memory collection.
pub struct InMemoryIndex {
    name: String,
    embedder: Arc<Embedder>,
    entries: RwLock<Vec<Entry>>,
}

impl InMemoryIndex {
    fn poisoned() -> AppError {
        AppError::Other("Vector index lock poisoned".to_string())
    }
}

#[async_trait::async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, chunks: &[Chunk]) -> AppResult<usize> {
        let embeddings = self.embedder.embed_chunks(chunks).await?;

        let mut entries = self.entries.write().map_err(|_| Self::poisoned())?;
        entries.extend(
            chunks
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(chunk, embedding)| Entry { chunk, embedding }),
        );

        tracing::debug!("Added {} chunks to collection '{}'", chunks.len(), self.name);
        Ok(chunks.len())
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
        min_similarity: Option<f32>,
    ) -> AppResult<Vec<ScoredChunk>> {
        let query_embedding = self.embedder.embed_query(query).await?;

        let entries = self.entries.read().map_err(|_| Self::poisoned())?;
        let scored = entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: entry.chunk.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();

        Ok(rank(scored, k, min_similarity))
    }

    async fn clear(&self) -> AppResult<()> {
        self.entries.write().map_err(|_| Self::poisoned())?.clear();
        tracing::debug!("Cleared collection '{}'", self.name);
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        Ok(self.entries.read().map_err(|_| Self::poisoned())?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::TrigramProvider;

    fn store() -> InMemoryStore {
        let embedder = Embedder::new(Arc::new(TrigramProvider::new(128)), 8).unwrap();
        InMemoryStore::new(Arc::new(embedder))
    }

    fn chunks(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Chunk::new(t.to_string(), "statement.txt", i, texts.len()))
            .collect()
    }

    #[tokio::test]
    async fn test_search_ranks_relevant_chunk_first() {
        let store = store();
        let index = store.create_or_connect("case").await.unwrap();
        index
            .add(&chunks(&[
                "The invoice was signed at the harbour office.",
                "Rain fell steadily across the valley all night.",
                "The courier delivered the parcel before noon.",
            ]))
            .await
            .unwrap();

        let results = index.search("who signed the invoice", 2, None).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].chunk.text.contains("invoice"));
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_threshold_filters_everything_unrelated() {
        let store = store();
        let index = store.create_or_connect("case").await.unwrap();
        index.add(&chunks(&["Completely unrelated weather report."])).await.unwrap();

        let results = index.search("invoice signature", 5, Some(0.99)).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_connect_returns_same_collection_and_clear_keeps_it() {
        let store = store();
        let first = store.create_or_connect("case").await.unwrap();
        first.add(&chunks(&["one", "two"])).await.unwrap();

        let again = store.create_or_connect("case").await.unwrap();
        assert_eq!(again.count().await.unwrap(), 2);

        again.clear().await.unwrap();
        assert_eq!(first.count().await.unwrap(), 0);
        first.add(&chunks(&["three"])).await.unwrap();
        assert_eq!(again.count().await.unwrap(), 1);

        let other = store.create_or_connect("other").await.unwrap();
        assert_eq!(other.count().await.unwrap(), 0);
    }
}
