//! Test doubles shared by the engine tests.

use crate::answer_source::{AnswerSource, RetrievalOptions, RetrievalSource, SourceMode};
use crate::interrogator::Interrogator;
use crate::strategy::Strategy;
use inquest_core::{AppError, AppResult};
use inquest_knowledge::embeddings::providers::TrigramProvider;
use inquest_knowledge::{
    ChunkConfig, DocumentSource, Embedder, EmbeddingProvider, FileLoader, InMemoryStore,
    IngestionPipeline, LoadedDocument, RecursiveSplitter,
};
use inquest_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use inquest_prompt::{Locale, PromptCatalog};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// An answer that triggers no heuristic rule and no absence marker.
pub const NEUTRAL: &str = "Nothing unusual stood out.";

pub fn catalog() -> PromptCatalog {
    PromptCatalog::load(None, Locale::En).unwrap()
}

pub fn offline(initial: Strategy) -> Interrogator {
    Interrogator::new(catalog(), initial).unwrap()
}

/// Text generator with separate scripts for requests carrying a system prompt
/// (question generation, answer synthesis) and analysis requests.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub questions: Mutex<VecDeque<AppResult<String>>>,
    pub analyses: Mutex<VecDeque<AppResult<String>>>,
    pub requests: Mutex<Vec<LlmRequest>>,
    question_calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question(self, reply: impl Into<String>) -> Self {
        self.questions.lock().unwrap().push_back(Ok(reply.into()));
        self
    }

    pub fn analysis(self, reply: impl Into<String>) -> Self {
        self.analyses.lock().unwrap().push_back(Ok(reply.into()));
        self
    }

    pub fn failing_analysis(self, err: AppError) -> Self {
        self.analyses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn question_calls(&self) -> usize {
        self.question_calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedGenerator {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let content = if request.system.is_some() {
            let call = self.question_calls.fetch_add(1, Ordering::SeqCst) + 1;
            self.questions
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(format!("Generated question {}?", call)))?
        } else {
            self.analyses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("FINDINGS:\nFOLLOW-UPS:\n".to_string()))?
        };
        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
            done: true,
        })
    }
}

/// Answer source replaying scripted answers, then repeating the last one.
pub struct ScriptedSource {
    answers: Mutex<VecDeque<AppResult<String>>>,
    last: Mutex<String>,
    pub questions: Mutex<Vec<String>>,
    pub resets: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    reset_delay: Duration,
}

impl ScriptedSource {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| Ok(a.to_string())).collect()),
            last: Mutex::new(NEUTRAL.to_string()),
            questions: Mutex::new(Vec::new()),
            resets: AtomicUsize::new(0),
            gate: None,
            reset_delay: Duration::ZERO,
        }
    }

    pub fn neutral() -> Self {
        Self::new(&[])
    }

    pub fn failing_at(answers: &[&str], err: AppError) -> Self {
        let source = Self::new(answers);
        source.answers.lock().unwrap().push_back(Err(err));
        source
    }

    /// Every `ask` waits for a permit from `gate` before answering.
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn slow_reset(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    pub fn asked(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AnswerSource for ScriptedSource {
    fn mode(&self) -> SourceMode {
        SourceMode::Direct
    }

    async fn ask(&self, question: &str) -> AppResult<String> {
        self.questions.lock().unwrap().push(question.to_string());
        if let Some(gate) = &self.gate {
            let _permit = gate.acquire().await.unwrap();
        }
        let next = self.answers.lock().unwrap().pop_front();
        match next {
            Some(Ok(answer)) => {
                *self.last.lock().unwrap() = answer.clone();
                Ok(answer)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last.lock().unwrap().clone()),
        }
    }

    async fn reset_chat(&self) -> AppResult<()> {
        tokio::time::sleep(self.reset_delay).await;
        self.resets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// File loader that counts loads, can be slowed down and can fail its first
/// attempts.
pub struct CountingLoader {
    inner: FileLoader,
    pub loads: AtomicUsize,
    delay: Duration,
    fail_first: usize,
}

impl CountingLoader {
    pub fn new(delay: Duration, fail_first: usize) -> Self {
        Self {
            inner: FileLoader::default(),
            loads: AtomicUsize::new(0),
            delay,
            fail_first,
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl DocumentSource for CountingLoader {
    async fn load(&self, path: &Path) -> AppResult<LoadedDocument> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if attempt <= self.fail_first {
            return Err(AppError::transport_status(503, "document service unavailable"));
        }
        self.inner.load(path).await
    }
}

pub const STATEMENT: &str = "The shed behind the house was locked every night.\n\n\
The gardener kept the only key on a hook in the kitchen.\n\n\
On the night of the fire the hook was empty.";

/// Trigram embeddings that record the size of every batch requested.
#[derive(Debug)]
pub struct CountingProvider {
    inner: TrigramProvider,
    batches: Mutex<Vec<usize>>,
}

impl CountingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: TrigramProvider::new(dimensions),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub fn batches(&self) -> Vec<usize> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CountingProvider {
    fn provider_name(&self) -> &str {
        "counting"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.batches.lock().unwrap().push(texts.len());
        self.inner.embed_batch(texts).await
    }
}

/// A retrieval source over a temporary statement, with its loader, embeddings,
/// store and generator exposed for inspection.
pub struct RetrievalFixture {
    pub _dir: tempfile::TempDir,
    pub loader: Arc<CountingLoader>,
    pub embeddings: Arc<CountingProvider>,
    pub store: Arc<InMemoryStore>,
    pub generator: Arc<ScriptedGenerator>,
    pub source: RetrievalSource,
}

pub fn retrieval_fixture(
    loader: CountingLoader,
    min_similarity: Option<f32>,
) -> RetrievalFixture {
    let dir = tempfile::TempDir::new().unwrap();
    let document: PathBuf = dir.path().join("statement.txt");
    std::fs::write(&document, STATEMENT).unwrap();

    let embeddings = Arc::new(CountingProvider::new(128));
    let embedder = Embedder::new(embeddings.clone(), 8).unwrap();
    let store = Arc::new(InMemoryStore::new(Arc::new(embedder)));
    let loader = Arc::new(loader);
    let splitter = RecursiveSplitter::new(ChunkConfig {
        chunk_size: 80,
        overlap: 0,
    })
    .unwrap();
    let pipeline = IngestionPipeline::new(loader.clone(), splitter, store.clone(), "case");

    let generator = Arc::new(ScriptedGenerator::new());
    let source = RetrievalSource::new(
        Arc::new(pipeline),
        document,
        generator.clone(),
        catalog(),
        RetrievalOptions {
            model: "test-model".to_string(),
            top_k: 2,
            min_similarity,
        },
    );

    RetrievalFixture {
        _dir: dir,
        loader,
        embeddings,
        store,
        generator,
        source,
    }
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually(check: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
