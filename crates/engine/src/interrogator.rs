//! Strategy engine.
//!
//! [`Interrogator::interrogate`] drives the question/answer loop. The engine
//! holds no per-run state: each call builds its own [`RunContext`], so one
//! `Interrogator` can serve any number of runs, concurrently or not.

use crate::analysis::{heuristic_analysis, parse_sections, AnswerAnalysis};
use crate::answer_source::AnswerSource;
use crate::progress::{emit, ProgressSink};
use crate::strategy::Strategy;
use crate::types::{ConversationTurn, InterrogationOutcome, ProgressEvent, RunStatus};
use inquest_core::{AppError, AppResult};
use inquest_llm::{LlmClient, LlmRequest};
use inquest_prompt::{builtin_packs, BuiltPrompt, PromptCatalog, PromptPack};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Per-call state, created fresh by every `interrogate`.
struct RunContext {
    strategy: Strategy,
    turns: Vec<ConversationTurn>,
    findings: Vec<String>,
}

/// What the loop does after an iteration.
#[derive(Debug, PartialEq)]
enum Decision {
    /// Ask this follow-up next, same strategy
    FollowUp(String),
    /// Switch strategy and generate a fresh initial question
    Switch(Strategy),
    /// The cycle wrapped to the initial strategy
    Complete,
}

/// Drives one interrogation run at a time per call.
pub struct Interrogator {
    catalog: PromptCatalog,
    /// Every built-in pack plus the active one, for locale-agnostic checks
    packs: Vec<PromptPack>,
    generator: Option<(Arc<dyn LlmClient>, String)>,
    initial_strategy: Strategy,
}

impl Interrogator {
    /// An offline interrogator: fallback questions and heuristic analysis.
    pub fn new(catalog: PromptCatalog, initial_strategy: Strategy) -> AppResult<Self> {
        let mut packs = builtin_packs()?;
        packs.push(catalog.pack().clone());
        Ok(Self {
            catalog,
            packs,
            generator: None,
            initial_strategy,
        })
    }

    /// Generate questions and analyses with `client`. Generator failures are
    /// then fatal for the run.
    pub fn with_generator(mut self, client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        self.generator = Some((client, model.into()));
        self
    }

    pub fn initial_strategy(&self) -> Strategy {
        self.initial_strategy
    }

    /// Run the loop until the strategy cycle completes, the budget runs out or
    /// `cancel` fires. Cancellation is checked only before each iteration; an
    /// in-flight call is allowed to finish.
    #[instrument(skip_all, fields(max_iterations = max_iterations, initial = %self.initial_strategy))]
    pub async fn interrogate(
        &self,
        hypothesis: &str,
        source: &dyn AnswerSource,
        max_iterations: usize,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> AppResult<InterrogationOutcome> {
        if max_iterations == 0 {
            return Err(AppError::Config(
                "maxIterations must be at least 1".to_string(),
            ));
        }

        let mut ctx = RunContext {
            strategy: self.initial_strategy,
            turns: Vec::new(),
            findings: Vec::new(),
        };
        let mut next_question: Option<String> = None;
        let mut status = RunStatus::LimitReached;

        tracing::info!(mode = %source.mode(), "Interrogation started");

        for iteration in 1..=max_iterations {
            if cancel.is_cancelled() {
                tracing::info!(iteration, "Interrogation cancelled");
                status = RunStatus::Cancelled;
                break;
            }

            let question = match next_question.take() {
                Some(question) => question,
                None => self.initial_question(&ctx, hypothesis).await?,
            };
            tracing::debug!(iteration, strategy = %ctx.strategy, %question, "Asking");

            let answer = source.ask(&question).await?;
            let analysis = self.analyze(&question, &answer).await?;

            ctx.findings.extend(analysis.findings.iter().cloned());
            ctx.turns.push(ConversationTurn {
                question: question.clone(),
                answer: answer.clone(),
                strategy: ctx.strategy,
                findings: analysis.findings,
                follow_ups: analysis.follow_ups,
            });

            let decision = self.decide(&ctx);
            let event_status = match decision {
                Decision::Complete => RunStatus::Completed,
                _ if iteration == max_iterations => RunStatus::LimitReached,
                _ => RunStatus::Running,
            };

            emit(
                progress,
                &ProgressEvent {
                    iteration,
                    max_iterations,
                    strategy: ctx.strategy,
                    question,
                    answer,
                    findings: ctx.findings.clone(),
                    status: event_status,
                },
            );

            match decision {
                Decision::FollowUp(question) => next_question = Some(question),
                Decision::Switch(strategy) => {
                    tracing::debug!(from = %ctx.strategy, to = %strategy, "Switching strategy");
                    ctx.strategy = strategy;
                }
                Decision::Complete => {
                    status = RunStatus::Completed;
                    break;
                }
            }
        }

        tracing::info!(
            status = %status,
            turns = ctx.turns.len(),
            findings = ctx.findings.len(),
            "Interrogation finished"
        );

        Ok(InterrogationOutcome {
            iterations: ctx.turns.len(),
            findings: ctx.findings,
            turns: ctx.turns,
            final_strategy: ctx.strategy,
            status,
        })
    }

    fn decide(&self, ctx: &RunContext) -> Decision {
        let stuck = ctx.turns.len() >= 2
            && ctx.turns[ctx.turns.len() - 2..]
                .iter()
                .all(|turn| self.indicates_absence(turn));

        if stuck {
            tracing::debug!("Two consecutive answers lack the information; forcing a switch");
        } else if let Some(follow_up) = ctx.turns.last().and_then(|t| t.follow_ups.first()) {
            return Decision::FollowUp(follow_up.clone());
        }

        let next = ctx.strategy.next();
        if next == self.initial_strategy {
            Decision::Complete
        } else {
            Decision::Switch(next)
        }
    }

    /// Whether a turn says the requested information is absent, in any locale.
    fn indicates_absence(&self, turn: &ConversationTurn) -> bool {
        self.packs.iter().any(|pack| {
            pack.matches_absence(&turn.answer)
                || turn
                    .findings
                    .iter()
                    .any(|f| *f == pack.absence_finding || pack.matches_absence(f))
        })
    }

    async fn initial_question(&self, ctx: &RunContext, hypothesis: &str) -> AppResult<String> {
        let strategy = ctx.strategy;
        if strategy == Strategy::DeepDive && self.packs.iter().any(|p| p.reads_as_question(hypothesis)) {
            return Ok(hypothesis.trim().to_string());
        }

        let Some((client, model)) = &self.generator else {
            return self.catalog.fallback_question(strategy.as_str(), hypothesis);
        };

        let prompt = self
            .catalog
            .question_prompt(strategy.as_str(), hypothesis, &format_history(&ctx.turns))?;
        let generated = complete(client.as_ref(), model, prompt, 0.7).await?;

        match clean_question(&generated) {
            Some(question) => Ok(question),
            None => {
                tracing::warn!(%strategy, "Generator returned no question; using the fallback");
                self.catalog.fallback_question(strategy.as_str(), hypothesis)
            }
        }
    }

    async fn analyze(&self, question: &str, answer: &str) -> AppResult<AnswerAnalysis> {
        let pack = self.catalog.pack();
        let Some((client, model)) = &self.generator else {
            return Ok(heuristic_analysis(answer, pack, &self.packs));
        };

        let prompt = self.catalog.analysis_prompt(question, answer)?;
        let response = complete(client.as_ref(), model, prompt, 0.2).await?;

        Ok(parse_sections(&response, &self.packs).unwrap_or_else(|| {
            tracing::debug!("Analysis output has no section labels; using heuristics");
            heuristic_analysis(answer, pack, &self.packs)
        }))
    }
}

async fn complete(
    client: &dyn LlmClient,
    model: &str,
    prompt: BuiltPrompt,
    temperature: f32,
) -> AppResult<String> {
    let mut request = LlmRequest::new(prompt.user, model).with_temperature(temperature);
    if let Some(system) = prompt.system {
        request = request.with_system(system);
    }
    tracing::debug!(template = %prompt.metadata.template_id, "Calling text generator");
    Ok(client.complete(&request).await?.content)
}

fn format_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("Q: {}\nA: {}", t.question, t.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// First non-empty line, without list markers or wrapping quotes.
fn clean_question(generated: &str) -> Option<String> {
    let line = generated.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = line
        .trim_start_matches(['-', '*', '•'])
        .trim()
        .trim_matches(['"', '\'', '“', '”'])
        .trim();
    (!line.is_empty()).then(|| line.to_string())
}
