//! LanceDB-backed vector store.

use super::{cosine_similarity, rank, ScoredChunk, VectorIndex, VectorStore};
use crate::chunk::Chunk;
use crate::embeddings::Embedder;
use arrow_array::{
    Array, FixedSizeListArray, Float32Array, RecordBatch, RecordBatchIterator, StringArray,
    UInt64Array,
};
use arrow_schema::{DataType, Field, Schema};
use futures::TryStreamExt;
use inquest_core::{AppError, AppResult};
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::Table;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Collections persisted as LanceDB tables under one directory.
pub struct LanceDbStore {
    db_path: PathBuf,
    embedder: Arc<Embedder>,
}

impl LanceDbStore {
    pub fn new(db_path: &Path, embedder: Arc<Embedder>) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
            embedder,
        }
    }
}

fn store_error(context: &str, e: impl std::fmt::Display) -> AppError {
    AppError::transport(format!("{}: {}", context, e))
}

#[async_trait::async_trait]
impl VectorStore for LanceDbStore {
    async fn create_or_connect(&self, name: &str) -> AppResult<Arc<dyn VectorIndex>> {
        std::fs::create_dir_all(&self.db_path)?;

        let uri = self.db_path.to_string_lossy().to_string();
        let conn = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| store_error("Failed to connect to LanceDB", e))?;

        let table_names = conn
            .table_names()
            .execute()
            .await
            .map_err(|e| store_error("Failed to list tables", e))?;

        let dimensions = self.embedder.dimensions();
        let table = if table_names.iter().any(|t| t == name) {
            conn.open_table(name)
                .execute()
                .await
                .map_err(|e| store_error("Failed to open table", e))?
        } else {
            let schema = LanceDbIndex::schema(dimensions);
            let empty_batch = RecordBatch::new_empty(schema.clone());

            conn.create_table(
                name,
                RecordBatchIterator::new(vec![Ok(empty_batch)], schema),
            )
            .execute()
            .await
            .map_err(|e| store_error("Failed to create table", e))?
        };

        tracing::debug!("Opened LanceDB collection '{}' at {:?}", name, self.db_path);

        Ok(Arc::new(LanceDbIndex {
            name: name.to_string(),
            table,
            embedder: Arc::clone(&self.embedder),
            dimensions,
        }))
    }
}

/// One LanceDB table.
pub struct LanceDbIndex {
    name: String,
    table: Table,
    embedder: Arc<Embedder>,
    dimensions: usize,
}

impl LanceDbIndex {
    fn schema(dimensions: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("source_path", DataType::Utf8, false),
            Field::new("position", DataType::UInt64, false),
            Field::new("total_chunks", DataType::UInt64, false),
            Field::new("text", DataType::Utf8, false),
            Field::new(
                "embedding",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, true)),
                    dimensions as i32,
                ),
                false,
            ),
        ]))
    }

    fn to_batch(&self, chunks: &[Chunk], embeddings: Vec<Vec<f32>>) -> AppResult<RecordBatch> {
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimensions) {
            return Err(AppError::Ingestion(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                bad.len()
            )));
        }

        let ids: Vec<&str> = chunks.iter().map(|c| c.metadata.hash.as_str()).collect();
        let paths: Vec<String> = chunks
            .iter()
            .map(|c| c.metadata.source_path.to_string_lossy().to_string())
            .collect();
        let positions: Vec<u64> = chunks.iter().map(|c| c.metadata.position as u64).collect();
        let totals: Vec<u64> = chunks
            .iter()
            .map(|c| c.metadata.total_chunks as u64)
            .collect();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        let values = Float32Array::from(embeddings.into_iter().flatten().collect::<Vec<f32>>());
        let embedding_array = FixedSizeListArray::try_new(
            Arc::new(Field::new("item", DataType::Float32, true)),
            self.dimensions as i32,
            Arc::new(values),
            None,
        )
        .map_err(|e| AppError::Ingestion(format!("Failed to build embedding column: {}", e)))?;

        RecordBatch::try_new(
            Self::schema(self.dimensions),
            vec![
                Arc::new(StringArray::from(ids)),
                Arc::new(StringArray::from(paths)),
                Arc::new(UInt64Array::from(positions)),
                Arc::new(UInt64Array::from(totals)),
                Arc::new(StringArray::from(texts)),
                Arc::new(embedding_array),
            ],
        )
        .map_err(|e| AppError::Ingestion(format!("Failed to create RecordBatch: {}", e)))
    }

    fn from_batch(batch: &RecordBatch, query: &[f32]) -> AppResult<Vec<ScoredChunk>> {
        fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> AppResult<&'a T> {
            batch
                .column_by_name(name)
                .and_then(|c| c.as_any().downcast_ref::<T>())
                .ok_or_else(|| AppError::transport(format!("Invalid {} column", name)))
        }

        let paths = column::<StringArray>(batch, "source_path")?;
        let positions = column::<UInt64Array>(batch, "position")?;
        let totals = column::<UInt64Array>(batch, "total_chunks")?;
        let texts = column::<StringArray>(batch, "text")?;
        let embeddings = column::<FixedSizeListArray>(batch, "embedding")?;

        let mut scored = Vec::with_capacity(batch.num_rows());
        for row in 0..batch.num_rows() {
            let values = embeddings.value(row);
            let Some(values) = values.as_any().downcast_ref::<Float32Array>() else {
                tracing::warn!("Skipping row {} with invalid embedding values", row);
                continue;
            };
            let embedding: Vec<f32> = values.values().to_vec();

            let chunk = Chunk::new(
                texts.value(row).to_string(),
                paths.value(row),
                positions.value(row) as usize,
                totals.value(row) as usize,
            );
            scored.push(ScoredChunk {
                chunk,
                score: cosine_similarity(query, &embedding),
            });
        }
        Ok(scored)
    }
}

#[async_trait::async_trait]
impl VectorIndex for LanceDbIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn add(&self, chunks: &[Chunk]) -> AppResult<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed_chunks(chunks).await?;
        let batch = self.to_batch(chunks, embeddings)?;
        let schema = batch.schema();

        self.table
            .add(RecordBatchIterator::new(vec![Ok(batch)], schema))
            .execute()
            .await
            .map_err(|e| store_error("Failed to add chunks", e))?;

        tracing::debug!("Inserted {} chunks into LanceDB table '{}'", chunks.len(), self.name);
        Ok(chunks.len())
    }

    async fn search(
        &self,
        query: &str,
        k: usize,
        min_similarity: Option<f32>,
    ) -> AppResult<Vec<ScoredChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self.embedder.embed_query(query).await?;

        let batches = self
            .table
            .query()
            .nearest_to(query_embedding.clone())
            .map_err(|e| store_error("Failed to create query", e))?
            .limit(k)
            .execute()
            .await
            .map_err(|e| store_error("Failed to execute search", e))?
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| store_error("Failed to collect results", e))?;

        let mut scored = Vec::new();
        for batch in &batches {
            scored.extend(Self::from_batch(batch, &query_embedding)?);
        }

        Ok(rank(scored, k, min_similarity))
    }

    async fn clear(&self) -> AppResult<()> {
        let count = self.count().await?;
        if count > 0 {
            self.table
                .delete("id IS NOT NULL")
                .await
                .map_err(|e| store_error("Failed to clear table", e))?;
        }
        tracing::debug!("Cleared LanceDB table '{}'", self.name);
        Ok(())
    }

    async fn count(&self) -> AppResult<usize> {
        self.table
            .count_rows(None)
            .await
            .map_err(|e| store_error("Failed to count rows", e))
    }
}
