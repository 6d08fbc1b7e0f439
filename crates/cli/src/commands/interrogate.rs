//! Interrogate command handler.
//!
//! Runs one interrogation session in the background, printing each iteration
//! as it completes. Ctrl-C stops the session; the turns completed so far are
//! still reported.

use super::{ingestion_progress, SourceArgs};
use clap::Args;
use inquest_core::{config::AppConfig, AppError, AppResult};
use inquest_engine::{
    build_answer_source, build_generator, InterrogationOutcome, Interrogator, ProgressEvent,
    SessionConfig, SessionController, Strategy,
};
use inquest_prompt::{Locale, PromptCatalog};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Interrogate a source about a hypothesis
#[derive(Args, Debug)]
pub struct InterrogateCommand {
    /// The hypothesis to investigate
    pub hypothesis: String,

    #[command(flatten)]
    pub source: SourceArgs,

    /// Iteration budget (default from config)
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Initial strategy (broad-overview, deep-dive, fact-check, timeline)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Use fallback questions and heuristic analysis instead of the text generator
    #[arg(long)]
    pub offline: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InterrogateCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing interrogate command");

        let mut config = self.source.apply(config);
        if let Some(max_iterations) = self.max_iterations {
            config.interrogation.max_iterations = max_iterations;
        }
        if let Some(strategy) = &self.strategy {
            config.interrogation.initial_strategy = strategy.clone();
        }

        let locale: Locale = config.interrogation.locale.parse()?;
        let strategy: Strategy = config.interrogation.initial_strategy.parse()?;
        let catalog = PromptCatalog::load(Some(&config.workspace), locale)?;

        let source = build_answer_source(&config, &catalog, ingestion_progress(self.json))?;
        let mut interrogator = Interrogator::new(catalog, strategy)?;
        if !self.offline {
            interrogator = interrogator.with_generator(build_generator(&config)?, config.model.clone());
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<ProgressEvent>();
        let controller = SessionController::new();
        let handle = controller.start(SessionConfig {
            hypothesis: self.hypothesis.clone(),
            max_iterations: config.interrogation.max_iterations,
            interrogator: Arc::new(interrogator),
            source,
            progress: Arc::new(tx),
        })?;
        let session_id = handle.id().to_string();
        tracing::debug!(%session_id, mode = %config.answer_source.mode, "Session running");

        let quiet = self.json;
        let printer = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if !quiet {
                    print_event(&event);
                }
            }
        });

        let outcome = handle.wait();
        tokio::pin!(outcome);
        let finished = tokio::select! {
            result = &mut outcome => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };
        let outcome = match finished {
            Some(result) => result?,
            None => {
                tracing::warn!("Interrupted; stopping session {}", session_id);
                if let Err(e) = controller.stop(&session_id) {
                    tracing::debug!("Session already finished: {}", e);
                }
                outcome.await?
            }
        };

        // The channel closes once the run drops its sink
        printer
            .await
            .map_err(|e| AppError::Other(format!("Progress printer failed: {}", e)))?;

        if self.json {
            let json = serde_json::to_string_pretty(&outcome)?;
            println!("{}", json);
        } else {
            print_summary(&outcome);
        }

        Ok(())
    }
}

fn print_event(event: &ProgressEvent) {
    println!(
        "[{}/{}] {} | Q: {} | A: {}",
        event.iteration,
        event.max_iterations,
        event.strategy,
        event.question,
        event.answer.replace('\n', " ")
    );
}

fn print_summary(outcome: &InterrogationOutcome) {
    println!();
    println!(
        "Status: {} after {} iteration(s), ending in {}",
        outcome.status, outcome.iterations, outcome.final_strategy
    );

    if outcome.findings.is_empty() {
        println!("No findings.");
        return;
    }

    println!("Findings:");
    for finding in &outcome.findings {
        println!("  - {}", finding);
    }
}
