//! Ingestion pipeline: load, split, embed and index one source document.

use crate::chunk::{estimated_chunk_count, RecursiveSplitter};
use crate::loader::DocumentSource;
use crate::progress::ProgressReporter;
use crate::store::{VectorIndex, VectorStore};
use inquest_core::{AppError, AppResult};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Counters for one ingestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionStats {
    pub chunks: usize,
    pub bytes: u64,
    pub estimated_chunks: usize,
    pub duration: Duration,
}

/// An index populated from a source document.
#[derive(Clone)]
pub struct IngestedIndex {
    pub index: Arc<dyn VectorIndex>,
    pub stats: IngestionStats,
}

impl std::fmt::Debug for IngestedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestedIndex")
            .field("collection", &self.index.name())
            .field("stats", &self.stats)
            .finish()
    }
}

/// Turns a source document into a searchable collection.
pub struct IngestionPipeline {
    loader: Arc<dyn DocumentSource>,
    splitter: RecursiveSplitter,
    store: Arc<dyn VectorStore>,
    collection: String,
    progress: ProgressReporter,
}

impl IngestionPipeline {
    pub fn new(
        loader: Arc<dyn DocumentSource>,
        splitter: RecursiveSplitter,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            loader,
            splitter,
            store,
            collection: collection.into(),
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Load `path`, split it, and replace the collection's contents with its
    /// chunks. Any failure is reported as an ingestion error.
    #[instrument(skip(self), fields(collection = %self.collection))]
    pub async fn ingest(&self, path: &Path) -> AppResult<IngestedIndex> {
        let start = Instant::now();
        tracing::info!("Ingesting {:?} into collection '{}'", path, self.collection);

        let document = self
            .loader
            .load(path)
            .await
            .map_err(|e| wrap("load", e))?;
        self.progress
            .load(document.metadata.size_bytes, &document.metadata.file_name);

        let config = self.splitter.config();
        let estimated_chunks = estimated_chunk_count(
            config.chunk_size,
            config.overlap,
            document.text.chars().count(),
        );
        let chunks = self.splitter.split(&document.metadata.source_path, &document.text);
        self.progress
            .split(chunks.len() as u64, Some(estimated_chunks as u64));

        if chunks.is_empty() {
            return Err(AppError::Ingestion(format!(
                "Document {:?} contains no text to index",
                path
            )));
        }

        let index = self
            .store
            .create_or_connect(&self.collection)
            .await
            .map_err(|e| wrap("connect", e))?;
        index.clear().await.map_err(|e| wrap("clear", e))?;

        self.progress.index(0, chunks.len() as u64, &self.collection);
        let added = index.add(&chunks).await.map_err(|e| wrap("index", e))?;
        self.progress
            .index(added as u64, chunks.len() as u64, &self.collection);

        let stats = IngestionStats {
            chunks: added,
            bytes: document.metadata.size_bytes,
            estimated_chunks,
            duration: start.elapsed(),
        };

        tracing::info!(
            "Ingestion completed: {} chunks (estimated {}), {} bytes in {:.2}s",
            stats.chunks,
            stats.estimated_chunks,
            stats.bytes,
            stats.duration.as_secs_f64()
        );

        Ok(IngestedIndex { index, stats })
    }
}

fn wrap(phase: &str, err: AppError) -> AppError {
    match err {
        AppError::Ingestion(_) => err,
        other => AppError::Ingestion(format!("{} failed: {}", phase, other)),
    }
}
