//! Character-sized chunking.
//!
//! Text is split at the coarsest semantic boundary that fits, from blank lines
//! down to single grapheme clusters, into chunks of a target size with a
//! configured overlap. Sizes and overlaps are measured in characters.

mod splitter;

pub use splitter::RecursiveSplitter;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// Chunking configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Characters shared between consecutive chunks
    pub overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap: 200,
        }
    }
}

/// A chunk of a source document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Chunk text content
    pub text: String,

    pub metadata: ChunkMetadata,
}

/// Where a chunk came from and how big it is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkMetadata {
    /// Origin document
    pub source_path: PathBuf,

    /// Chunk position in document (0-indexed)
    pub position: usize,

    /// Number of chunks the document produced
    pub total_chunks: usize,

    /// Character count
    pub char_count: usize,

    /// Byte length of the chunk text
    pub byte_len: usize,

    /// SHA-256 hash of chunk text
    pub hash: String,
}

impl Chunk {
    /// Create a chunk, deriving its size and hash from `text`.
    pub fn new(
        text: String,
        source_path: impl Into<PathBuf>,
        position: usize,
        total_chunks: usize,
    ) -> Self {
        let metadata = ChunkMetadata {
            source_path: source_path.into(),
            position,
            total_chunks,
            char_count: text.chars().count(),
            byte_len: text.len(),
            hash: calculate_hash(&text),
        };
        Self { text, metadata }
    }
}

/// Calculate SHA-256 hash of text.
pub fn calculate_hash(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

/// Estimate how many chunks a text of `total_len` characters produces,
/// without splitting it.
///
/// Returns `max(1, ceil((total_len - overlap) / (chunk_size - overlap)))`, and
/// 1 whenever `overlap >= chunk_size` or `chunk_size == 0`.
pub fn estimated_chunk_count(chunk_size: usize, overlap: usize, total_len: usize) -> usize {
    if chunk_size == 0 || overlap >= chunk_size {
        return 1;
    }
    let step = (chunk_size - overlap).max(1);
    total_len.saturating_sub(overlap).div_ceil(step).max(1)
}
