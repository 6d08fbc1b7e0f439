//! Command handlers for the Inquest CLI.

pub mod ask;
pub mod inspect;
pub mod interrogate;

pub use ask::AskCommand;
pub use inspect::InspectCommand;
pub use interrogate::InterrogateCommand;

use clap::Args;
use inquest_core::config::AppConfig;
use inquest_knowledge::ProgressReporter;
use std::path::PathBuf;
use std::sync::Arc;

/// Answer source selection shared by the commands that query one.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Answer source mode (direct, retrieval)
    #[arg(long)]
    pub mode: Option<String>,

    /// Source document for retrieval mode
    #[arg(short, long)]
    pub document: Option<PathBuf>,
}

impl SourceArgs {
    /// Config with these flags applied. A document implies retrieval mode
    /// unless a mode was given explicitly.
    pub fn apply(&self, config: &AppConfig) -> AppConfig {
        let mut config = config.clone();
        if let Some(document) = &self.document {
            config.answer_source.document = Some(document.clone());
            if self.mode.is_none() {
                config.answer_source.mode = "retrieval".to_string();
            }
        }
        if let Some(mode) = &self.mode {
            config.answer_source.mode = mode.clone();
        }
        config
    }
}

/// Reporter printing ingestion phases to stderr, or none when output must stay
/// machine-readable.
pub fn ingestion_progress(json: bool) -> Option<ProgressReporter> {
    if json {
        return None;
    }
    Some(ProgressReporter::new(Arc::new(|event| {
        eprintln!("{}", event.format_simple());
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_implies_retrieval() {
        let mut base = AppConfig::default();
        base.answer_source.mode = "direct".to_string();

        let args = SourceArgs {
            mode: None,
            document: Some(PathBuf::from("case.txt")),
        };
        let config = args.apply(&base);
        assert_eq!(config.answer_source.mode, "retrieval");
        assert_eq!(config.answer_source.document, Some(PathBuf::from("case.txt")));

        let args = SourceArgs {
            mode: Some("direct".to_string()),
            document: Some(PathBuf::from("case.txt")),
        };
        assert_eq!(args.apply(&base).answer_source.mode, "direct");
    }

    #[test]
    fn test_json_output_suppresses_ingestion_progress() {
        assert!(ingestion_progress(true).is_none());
        assert!(ingestion_progress(false).is_some());
    }
}
