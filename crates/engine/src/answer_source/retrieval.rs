//! Retrieval answer source over a locally ingested document.

use super::{AnswerSource, SourceMode};
use crate::single_flight::{FlightStatus, SingleFlight};
use inquest_core::AppResult;
use inquest_knowledge::{retrieve, IngestionPipeline, VectorIndex};
use inquest_llm::{LlmClient, LlmRequest};
use inquest_prompt::PromptCatalog;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

/// Retrieval and synthesis settings.
#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    /// Text-generation model for answer synthesis
    pub model: String,
    /// Chunks retrieved per question
    pub top_k: usize,
    /// Minimum cosine similarity for a retrieved chunk
    pub min_similarity: Option<f32>,
}

/// Answers from the chunks of one document, ingested on first use.
pub struct RetrievalSource {
    pipeline: Arc<IngestionPipeline>,
    document: PathBuf,
    generator: Arc<dyn LlmClient>,
    catalog: PromptCatalog,
    options: RetrievalOptions,
    ingestion: SingleFlight<Arc<dyn VectorIndex>>,
}

impl RetrievalSource {
    pub fn new(
        pipeline: Arc<IngestionPipeline>,
        document: PathBuf,
        generator: Arc<dyn LlmClient>,
        catalog: PromptCatalog,
        options: RetrievalOptions,
    ) -> Self {
        Self {
            pipeline,
            document,
            generator,
            catalog,
            options,
            ingestion: SingleFlight::new(),
        }
    }

    pub fn ingestion_status(&self) -> AppResult<FlightStatus> {
        self.ingestion.status()
    }

    /// The document's index, ingesting it if no attempt has succeeded yet.
    async fn index(&self) -> AppResult<Arc<dyn VectorIndex>> {
        let pipeline = Arc::clone(&self.pipeline);
        let document = self.document.clone();
        self.ingestion
            .get_or_init(move || async move {
                let ingested = pipeline.ingest(&document).await?;
                Ok(ingested.index)
            })
            .await
    }
}

#[async_trait::async_trait]
impl AnswerSource for RetrievalSource {
    fn mode(&self) -> SourceMode {
        SourceMode::Retrieval
    }

    #[instrument(skip(self, question), fields(document = ?self.document))]
    async fn ask(&self, question: &str) -> AppResult<String> {
        let index = self.index().await?;

        let retrieved = retrieve(
            index.as_ref(),
            question,
            self.options.top_k,
            self.options.min_similarity,
        )
        .await?;

        if retrieved.is_empty() {
            tracing::debug!("No relevant chunks; answering with the no-information reply");
            return Ok(self.catalog.pack().no_information_answer.clone());
        }

        let prompt = self.catalog.rag_prompt(&retrieved.context, question)?;
        let mut request = LlmRequest::new(prompt.user, &self.options.model).with_temperature(0.2);
        if let Some(system) = prompt.system {
            request = request.with_system(system);
        }

        tracing::debug!(
            chunks = retrieved.chunks.len(),
            top_score = ?retrieved.max_score(),
            "Synthesizing answer"
        );
        let response = self.generator.complete(&request).await?;
        Ok(response.content.trim().to_string())
    }

    /// Wipe the ingested collection so the next `ask` re-ingests the document.
    async fn reset_chat(&self) -> AppResult<()> {
        if let Some(index) = self.ingestion.reset()? {
            index.clear().await?;
            tracing::debug!("Cleared collection '{}'", index.name());
        }
        Ok(())
    }
}
