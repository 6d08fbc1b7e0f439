//! Configuration management for Inquest.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.inquest/config.yaml` in the workspace, or `INQUEST_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! All validation happens here, before any run starts, so that a missing
//! credential or mode-specific field is reported at construction time and never
//! in the middle of an interrogation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Known text-generation providers.
pub const KNOWN_PROVIDERS: [&str; 1] = ["ollama"];

/// Known embedding providers.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "trigram"];

/// Known answer-source modes.
pub const KNOWN_MODES: [&str; 2] = ["direct", "retrieval"];

/// Known questioning strategies, in cycle order.
pub const KNOWN_STRATEGIES: [&str; 4] = ["broad-overview", "deep-dive", "fact-check", "timeline"];

/// Known vector store backends.
pub const KNOWN_STORES: [&str; 2] = ["memory", "lancedb"];

/// Known prompt locales.
pub const KNOWN_LOCALES: [&str; 2] = ["en", "pt"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .inquest/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Text-generation provider (e.g., "ollama")
    pub provider: String,

    /// Text-generation model identifier
    pub model: String,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Per-provider endpoint settings
    pub providers: HashMap<String, ProviderConfig>,

    /// Interrogation loop settings
    pub interrogation: InterrogationConfig,

    /// Answer source settings
    pub answer_source: AnswerSourceConfig,

    /// Document ingestion settings
    pub ingestion: IngestionConfig,

    /// Embedding settings
    pub embedding: EmbeddingSettings,
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub model: String,
    /// Request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,
}

/// Interrogation loop settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InterrogationConfig {
    /// Iteration budget per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Strategy the run starts with
    #[serde(default = "default_initial_strategy")]
    pub initial_strategy: String,

    /// Prompt locale ("en" or "pt")
    #[serde(default = "default_locale")]
    pub locale: String,
}

/// Answer source settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSourceConfig {
    /// "direct" or "retrieval"
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Source document (retrieval mode)
    #[serde(default)]
    pub document: Option<PathBuf>,

    /// Conversation endpoint (direct mode)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the conversation credential (direct mode)
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Number of chunks retrieved per question (retrieval mode)
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum cosine similarity for a retrieved chunk
    #[serde(default)]
    pub min_similarity: Option<f32>,

    /// Vector store collection name
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Vector store backend ("memory" or "lancedb")
    #[serde(default = "default_store")]
    pub store: String,
}

/// Document ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngestionConfig {
    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Documents above this size are rejected before reading
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

/// Embedding settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// "ollama" or "trigram"
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,

    /// Texts per embedding request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Embedding endpoint override
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_max_iterations() -> usize {
    10
}

fn default_initial_strategy() -> String {
    "broad-overview".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

fn default_mode() -> String {
    "retrieval".to_string()
}

fn default_api_key_env() -> String {
    "INQUEST_API_KEY".to_string()
}

fn default_top_k() -> usize {
    4
}

fn default_collection() -> String {
    "inquest-source".to_string()
}

fn default_store() -> String {
    "memory".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_max_document_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_embedding_provider() -> String {
    "trigram".to_string()
}

fn default_embedding_model() -> String {
    "trigram-v1".to_string()
}

fn default_embedding_dimensions() -> usize {
    384
}

fn default_batch_size() -> usize {
    32
}

impl Default for InterrogationConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            initial_strategy: default_initial_strategy(),
            locale: default_locale(),
        }
    }
}

impl Default for AnswerSourceConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            document: None,
            endpoint: None,
            api_key_env: default_api_key_env(),
            top_k: default_top_k(),
            min_similarity: None,
            collection: default_collection(),
            store: default_store(),
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            batch_size: default_batch_size(),
            endpoint: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    llm: Option<LlmSection>,
    workspace: Option<WorkspaceSection>,
    logging: Option<LoggingSection>,
    interrogation: Option<InterrogationConfig>,
    answer_source: Option<AnswerSourceConfig>,
    ingestion: Option<IngestionConfig>,
    embedding: Option<EmbeddingSettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LlmSection {
    #[serde(rename = "activeProvider")]
    active_provider: String,
    #[serde(default)]
    providers: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();
        providers.insert(
            "ollama".to_string(),
            ProviderConfig {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
                timeout: Some(120),
            },
        );

        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            log_level: None,
            verbose: false,
            no_color: false,
            providers,
            interrogation: InterrogationConfig::default(),
            answer_source: AnswerSourceConfig::default(),
            ingestion: IngestionConfig::default(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the YAML config file and environment variables.
    ///
    /// Environment variables:
    /// - `INQUEST_WORKSPACE`: Override workspace path
    /// - `INQUEST_CONFIG`: Path to config file
    /// - `INQUEST_PROVIDER`: Text-generation provider
    /// - `INQUEST_MODEL`: Model identifier
    /// - `INQUEST_LOCALE`: Prompt locale
    /// - `INQUEST_API_KEY`: Direct-mode credential (default `answerSource.apiKeyEnv`)
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use inquest_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Workspace: {:?}", config.workspace);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with_file(None)
    }

    /// Like [`AppConfig::load`], reading `config_file` instead of the
    /// `INQUEST_CONFIG` or workspace default file.
    pub fn load_with_file(config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(workspace) = std::env::var("INQUEST_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        config.config_file = config_file
            .or_else(|| std::env::var("INQUEST_CONFIG").ok().map(PathBuf::from));

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.inquest_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        if let Ok(provider) = std::env::var("INQUEST_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(model) = std::env::var("INQUEST_MODEL") {
            config.model = model;
        }

        if let Ok(locale) = std::env::var("INQUEST_LOCALE") {
            config.interrogation.locale = locale;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> AppResult<Self> {
        let config_file: ConfigFile = serde_yaml::from_str(contents)?;
        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(llm) = config_file.llm {
            result.providers.extend(llm.providers);
            if let Some(provider_config) = result.providers.get(&llm.active_provider) {
                result.model = provider_config.model.clone();
            }
            result.provider = llm.active_provider;
        }

        if let Some(interrogation) = config_file.interrogation {
            result.interrogation = interrogation;
        }
        if let Some(answer_source) = config_file.answer_source {
            result.answer_source = answer_source;
        }
        if let Some(ingestion) = config_file.ingestion {
            result.ingestion = ingestion;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and the
    /// config file.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        locale: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(workspace) = workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = config_file {
            self.config_file = Some(config_file);
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(locale) = locale {
            self.interrogation.locale = locale;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .inquest directory.
    pub fn inquest_dir(&self) -> PathBuf {
        self.workspace.join(".inquest")
    }

    /// Get the active provider configuration.
    pub fn provider_config(&self) -> Option<&ProviderConfig> {
        self.providers.get(&self.provider)
    }

    /// Resolve the direct-mode credential from its environment variable.
    pub fn resolve_source_api_key(&self) -> Option<String> {
        std::env::var(&self.answer_source.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty())
    }

    /// Validate configuration for the selected provider and answer-source mode.
    pub fn validate(&self) -> AppResult<()> {
        check_known("provider", &self.provider, &KNOWN_PROVIDERS)?;
        check_known(
            "embedding provider",
            &self.embedding.provider,
            &KNOWN_EMBEDDING_PROVIDERS,
        )?;
        check_known("answer source mode", &self.answer_source.mode, &KNOWN_MODES)?;
        check_known(
            "strategy",
            &self.interrogation.initial_strategy,
            &KNOWN_STRATEGIES,
        )?;
        check_known("locale", &self.interrogation.locale, &KNOWN_LOCALES)?;
        check_known("vector store", &self.answer_source.store, &KNOWN_STORES)?;

        if self.provider_config().is_none() {
            return Err(AppError::Config(format!(
                "No endpoint configured for provider '{}'",
                self.provider
            )));
        }

        if self.interrogation.max_iterations == 0 {
            return Err(AppError::Config(
                "maxIterations must be at least 1".to_string(),
            ));
        }

        if self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "Embedding batchSize must be at least 1".to_string(),
            ));
        }

        if self.ingestion.chunk_size == 0 {
            return Err(AppError::Config(
                "chunkSize must be at least 1".to_string(),
            ));
        }

        if self.ingestion.chunk_overlap >= self.ingestion.chunk_size {
            return Err(AppError::Config(format!(
                "chunkOverlap ({}) must be smaller than chunkSize ({})",
                self.ingestion.chunk_overlap, self.ingestion.chunk_size
            )));
        }

        match self.answer_source.mode.as_str() {
            "retrieval" => {
                if self.answer_source.document.is_none() {
                    return Err(AppError::Config(
                        "Retrieval mode requires a source document".to_string(),
                    ));
                }
            }
            "direct" => {
                if self.answer_source.endpoint.is_none() {
                    return Err(AppError::Config(
                        "Direct mode requires a conversation endpoint".to_string(),
                    ));
                }
                if self.resolve_source_api_key().is_none() {
                    return Err(AppError::Config(format!(
                        "API key not found in environment variable: {}",
                        self.answer_source.api_key_env
                    )));
                }
            }
            _ => {}
        }

        Ok(())
    }
}

fn check_known(what: &str, value: &str, known: &[&str]) -> AppResult<()> {
    if known.contains(&value) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Unknown {}: {}. Supported: {}",
            what,
            value,
            known.join(", ")
        )))
    }
}
