//! Retrieval helpers for answer synthesis.

use crate::store::{ScoredChunk, VectorIndex};
use inquest_core::AppResult;
use serde::Serialize;

/// Separator placed between excerpts in a rendered context block.
pub const EXCERPT_SEPARATOR: &str = "\n\n---\n\n";

/// Maximum snippet length for source references.
const MAX_SNIPPET_LENGTH: usize = 150;

/// Chunks retrieved for one question and the context rendered from them.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedContext {
    pub chunks: Vec<ScoredChunk>,

    /// `[Excerpt n]` sections, empty when nothing was retrieved
    pub context: String,
}

impl RetrievedContext {
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Highest similarity among the retrieved chunks.
    pub fn max_score(&self) -> Option<f32> {
        self.chunks.first().map(|c| c.score)
    }

    /// One `file:position` reference and a short snippet per chunk.
    pub fn sources(&self) -> Vec<SourceRef> {
        self.chunks
            .iter()
            .map(|scored| {
                let meta = &scored.chunk.metadata;
                let source = meta
                    .source_path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_else(|| meta.source_path.to_string_lossy().to_string());
                SourceRef {
                    source,
                    location: format!("chunk {}/{}", meta.position + 1, meta.total_chunks),
                    snippet: truncate_snippet(&scored.chunk.text, MAX_SNIPPET_LENGTH),
                }
            })
            .collect()
    }
}

/// Where a piece of context came from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SourceRef {
    pub source: String,
    pub location: String,
    pub snippet: String,
}

/// Search `index` and render the hits as a context block.
pub async fn retrieve(
    index: &dyn VectorIndex,
    question: &str,
    k: usize,
    min_similarity: Option<f32>,
) -> AppResult<RetrievedContext> {
    let chunks = index.search(question, k, min_similarity).await?;

    match chunks.first() {
        Some(top) => tracing::debug!(
            "Retrieved {} chunks from '{}' (top score: {:.3})",
            chunks.len(),
            index.name(),
            top.score
        ),
        None => tracing::debug!("No chunks retrieved from '{}'", index.name()),
    }

    let context = build_context(&chunks);
    Ok(RetrievedContext { chunks, context })
}

/// Render chunks as numbered excerpts.
pub fn build_context(chunks: &[ScoredChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, scored)| format!("[Excerpt {}]\n{}", i + 1, scored.chunk.text))
        .collect::<Vec<_>>()
        .join(EXCERPT_SEPARATOR)
}

fn truncate_snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
