//! Recursive splitter using the text-splitter crate.

use super::{Chunk, ChunkConfig};
use inquest_core::{AppError, AppResult};
use std::path::Path;
use text_splitter::{ChunkConfig as SplitterConfig, TextSplitter};

/// Splits text at the coarsest semantic level that fits the chunk size.
///
/// Levels descend from blank-line runs to lines, sentences, words and
/// grapheme clusters. Sizes are counted in characters.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    config: ChunkConfig,
}

impl RecursiveSplitter {
    /// Create a splitter, rejecting configurations that cannot make progress.
    pub fn new(config: ChunkConfig) -> AppResult<Self> {
        if config.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be at least 1".to_string()));
        }
        if config.overlap >= config.chunk_size {
            return Err(AppError::Config(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                config.overlap, config.chunk_size
            )));
        }
        splitter_config(&config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// Split `text` into chunks carrying position metadata.
    pub fn split(&self, source_path: &Path, text: &str) -> Vec<Chunk> {
        let pieces = self.split_text(text);
        let total = pieces.len();

        tracing::debug!(
            "Text splitter created {} chunks from {} characters",
            total,
            text.chars().count()
        );

        pieces
            .into_iter()
            .enumerate()
            .map(|(position, piece)| Chunk::new(piece, source_path, position, total))
            .collect()
    }

    /// Split `text` into trimmed, non-empty pieces.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        let Ok(config) = splitter_config(&self.config) else {
            // Validated in `new`
            return Vec::new();
        };
        TextSplitter::new(config)
            .chunks(text)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
            .map(str::to_string)
            .collect()
    }
}

fn splitter_config(config: &ChunkConfig) -> AppResult<SplitterConfig<text_splitter::Characters>> {
    SplitterConfig::new(config.chunk_size)
        .with_overlap(config.overlap)
        .map_err(|e| AppError::Config(format!("Invalid chunk configuration: {}", e)))
}
