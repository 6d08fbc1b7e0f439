//! Answer sources: the role being interrogated.
//!
//! Two variants implement [`AnswerSource`]:
//! - [`DirectSource`] forwards questions to a stateful conversational service;
//! - [`RetrievalSource`] ingests a local document once and answers from the
//!   chunks most relevant to each question.
//!
//! The variant is chosen from configuration by [`build_answer_source`].

mod direct;
mod retrieval;

pub use direct::DirectSource;
pub use retrieval::{RetrievalOptions, RetrievalSource};

use inquest_core::{AppConfig, AppError, AppResult};
use inquest_knowledge::{
    create_store, ChunkConfig, Embedder, EmbeddingConfig, FileLoader, IngestionPipeline,
    ProgressReporter, RecursiveSplitter,
};
use inquest_llm::{create_client, create_conversation_client, LlmClient};
use inquest_prompt::PromptCatalog;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Answer source variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Direct,
    Retrieval,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Direct => "direct",
            SourceMode::Retrieval => "retrieval",
        }
    }
}

impl fmt::Display for SourceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" => Ok(SourceMode::Direct),
            "retrieval" => Ok(SourceMode::Retrieval),
            other => Err(AppError::Config(format!(
                "Unknown answer source mode: {}. Supported: direct, retrieval",
                other
            ))),
        }
    }
}

/// Resolves questions to answers.
#[async_trait::async_trait]
pub trait AnswerSource: Send + Sync {
    fn mode(&self) -> SourceMode;

    /// Answer one question.
    async fn ask(&self, question: &str) -> AppResult<String>;

    /// Forget conversational state so the next run starts clean.
    async fn reset_chat(&self) -> AppResult<()>;
}

/// Build the text-generation client for the active provider.
pub fn build_generator(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let provider = config.provider_config();
    create_client(
        &config.provider,
        provider.map(|p| p.endpoint.as_str()),
        provider.and_then(|p| p.timeout).map(Duration::from_secs),
    )
}

/// Validate `config` and build the answer source it selects.
///
/// All configuration errors surface here, before any run starts. A retrieval
/// source reports its ingestion phases to `progress` when one is given.
pub fn build_answer_source(
    config: &AppConfig,
    catalog: &PromptCatalog,
    progress: Option<ProgressReporter>,
) -> AppResult<Arc<dyn AnswerSource>> {
    config.validate()?;

    match config.answer_source.mode.parse::<SourceMode>()? {
        SourceMode::Direct => {
            let api_key = config.resolve_source_api_key();
            let client = create_conversation_client(
                config.answer_source.endpoint.as_deref(),
                api_key.as_deref(),
            )?;
            Ok(Arc::new(DirectSource::new(client, catalog.role_framing()?)))
        }
        SourceMode::Retrieval => {
            let document = config.answer_source.document.clone().ok_or_else(|| {
                AppError::Config("Retrieval mode requires a source document".to_string())
            })?;

            let embedder = Embedder::from_config(&EmbeddingConfig::from(&config.embedding))?;
            let store = create_store(
                &config.answer_source.store,
                &config.inquest_dir().join("lancedb"),
                Arc::new(embedder),
            )?;
            let splitter = RecursiveSplitter::new(ChunkConfig {
                chunk_size: config.ingestion.chunk_size,
                overlap: config.ingestion.chunk_overlap,
            })?;
            let pipeline = IngestionPipeline::new(
                Arc::new(FileLoader::new(config.ingestion.max_document_bytes)),
                splitter,
                store,
                config.answer_source.collection.clone(),
            )
            .with_progress(progress.unwrap_or_default());

            let options = RetrievalOptions {
                model: config.model.clone(),
                top_k: config.answer_source.top_k,
                min_similarity: config.answer_source.min_similarity,
            };
            Ok(Arc::new(RetrievalSource::new(
                Arc::new(pipeline),
                document,
                build_generator(config)?,
                catalog.clone(),
                options,
            )))
        }
    }
}
