//! Interrogation engine for Inquest.
//!
//! An [`Interrogator`] questions an [`AnswerSource`] about a hypothesis,
//! rotating through the investigation [`Strategy`] cycle, following up on
//! what each answer reveals and accumulating findings. A [`SessionController`]
//! runs at most one interrogation at a time in the background and lets it be
//! stopped.
//!
//! # Example
//! ```no_run
//! use inquest_core::AppConfig;
//! use inquest_engine::{build_answer_source, Interrogator, NoProgress, Strategy};
//! use inquest_prompt::{Locale, PromptCatalog};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = AppConfig::default();
//! config.answer_source.document = Some("statement.txt".into());
//!
//! let catalog = PromptCatalog::load(None, Locale::En)?;
//! let source = build_answer_source(&config, &catalog, None)?;
//! let interrogator = Interrogator::new(catalog, Strategy::BroadOverview)?;
//!
//! let outcome = interrogator
//!     .interrogate("The shed was locked", source.as_ref(), 8, &CancellationToken::new(), &NoProgress)
//!     .await?;
//! for finding in &outcome.findings {
//!     println!("- {}", finding);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod answer_source;
pub mod interrogator;
pub mod progress;
pub mod session;
pub mod single_flight;
pub mod strategy;
pub mod types;

#[cfg(test)]
mod tests;

pub use analysis::{heuristic_analysis, parse_sections, AnswerAnalysis};
pub use answer_source::{
    build_answer_source, build_generator, AnswerSource, DirectSource, RetrievalOptions,
    RetrievalSource, SourceMode,
};
pub use interrogator::Interrogator;
pub use progress::{NoProgress, ProgressSink};
pub use session::{SessionConfig, SessionController, SessionHandle, SessionSnapshot, SessionStatus};
pub use single_flight::{FlightStatus, SingleFlight};
pub use strategy::Strategy;
pub use types::{ConversationTurn, InterrogationOutcome, ProgressEvent, RunStatus};
