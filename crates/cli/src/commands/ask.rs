//! Ask command handler.
//!
//! Sends a single question to the configured answer source.

use super::{ingestion_progress, SourceArgs};
use clap::Args;
use inquest_core::{config::AppConfig, AppResult};
use inquest_engine::{build_answer_source, AnswerSource};
use inquest_prompt::{Locale, PromptCatalog};

/// Ask the answer source a single question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let config = self.source.apply(config);
        let locale: Locale = config.interrogation.locale.parse()?;
        let catalog = PromptCatalog::load(Some(&config.workspace), locale)?;
        let source = build_answer_source(&config, &catalog, ingestion_progress(self.json))?;

        let answer = source.ask(&self.question).await?;

        if self.json {
            let output = serde_json::json!({
                "question": self.question,
                "answer": answer,
                "mode": source.mode(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", answer);
        }

        Ok(())
    }
}
