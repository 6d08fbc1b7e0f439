//! Content ingestion for Inquest.
//!
//! Turns a source document into a searchable chunk index:
//! loader → recursive splitter → embedder → vector store. The retrieval answer
//! source drives [`IngestionPipeline`] once per document and searches the
//! resulting [`VectorIndex`] with [`retrieve`].

pub mod chunk;
pub mod embeddings;
pub mod ingest;
pub mod loader;
pub mod progress;
pub mod rag;
pub mod store;

pub use chunk::{estimated_chunk_count, Chunk, ChunkConfig, ChunkMetadata, RecursiveSplitter};
pub use embeddings::{create_provider, Embedder, EmbeddingConfig, EmbeddingProvider};
pub use ingest::{IngestedIndex, IngestionPipeline, IngestionStats};
pub use loader::{ContentType, DocumentMetadata, DocumentSource, FileLoader, LoadedDocument};
pub use progress::{IngestionProgress, ProgressCallback, ProgressReporter};
pub use rag::{build_context, retrieve, RetrievedContext, SourceRef};
pub use store::{create_store, InMemoryStore, ScoredChunk, VectorIndex, VectorStore};

#[cfg(feature = "lancedb")]
pub use store::LanceDbStore;
