//! Inspect command handler.
//!
//! Loads and splits a document the way retrieval ingestion would, without
//! embedding or storing anything.

use clap::Args;
use inquest_core::{config::AppConfig, AppResult};
use inquest_knowledge::{
    estimated_chunk_count, ChunkConfig, DocumentSource, FileLoader, RecursiveSplitter,
};
use std::path::PathBuf;

/// Characters shown per chunk preview
const PREVIEW_CHARS: usize = 80;

/// Load and split a document without indexing it
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Document to inspect
    pub document: PathBuf,

    /// Chunk size in characters (default from config)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Overlap between chunks in characters (default from config)
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Number of chunks to preview
    #[arg(long, default_value = "3")]
    pub preview: usize,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InspectCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing inspect command for {:?}", self.document);

        let chunk_config = ChunkConfig {
            chunk_size: self.chunk_size.unwrap_or(config.ingestion.chunk_size),
            overlap: self.overlap.unwrap_or(config.ingestion.chunk_overlap),
        };
        let splitter = RecursiveSplitter::new(chunk_config.clone())?;
        let loader = FileLoader::new(config.ingestion.max_document_bytes);

        let document = loader.load(&self.document).await?;
        let estimated = estimated_chunk_count(
            chunk_config.chunk_size,
            chunk_config.overlap,
            document.text.chars().count(),
        );
        let chunks = splitter.split(&document.metadata.source_path, &document.text);
        let previews: Vec<String> = chunks
            .iter()
            .take(self.preview)
            .map(|c| preview(&c.text))
            .collect();

        if self.json {
            let output = serde_json::json!({
                "metadata": document.metadata,
                "chunkSize": chunk_config.chunk_size,
                "overlap": chunk_config.overlap,
                "estimatedChunks": estimated,
                "chunks": chunks.len(),
                "previews": previews,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        let meta = &document.metadata;
        println!("File:      {}", meta.file_name);
        println!("Type:      {}", meta.content_type.as_str());
        println!("Size:      {} bytes ({})", meta.size_bytes, meta.encoding);
        println!("SHA-256:   {}", meta.content_hash);
        println!(
            "Chunks:    {} (estimated {}, size {}, overlap {})",
            chunks.len(),
            estimated,
            chunk_config.chunk_size,
            chunk_config.overlap
        );
        for (i, text) in previews.iter().enumerate() {
            println!("  [{}] {}", i + 1, text);
        }

        Ok(())
    }
}

/// First characters of a chunk on one line.
fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("Line one.\n\nLine   two."), "Line one. Line two.");

        let long = "word ".repeat(40);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert!(shown.chars().count() <= PREVIEW_CHARS + 3);
    }
}
