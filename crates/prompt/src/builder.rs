//! Prompt catalog for rendering pack templates.
//!
//! Every prompt the engine sends goes through [`PromptCatalog`], which renders
//! the active pack's Handlebars templates. Template authors must honor two
//! contracts the engine cannot enforce on generated text:
//!
//! - analysis follow-ups are direct questions about the source content, never
//!   questions about the witness or whoever holds the information;
//! - role framing makes the answer source reply in the first person, only from
//!   supplied content, state absence explicitly, and never speak of itself in
//!   the third person.

use crate::loader::load_pack;
use crate::types::{BuiltPrompt, Locale, PromptPack};
use inquest_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Renders the templates of one prompt pack.
#[derive(Debug, Clone)]
pub struct PromptCatalog {
    pack: Arc<PromptPack>,
}

impl PromptCatalog {
    /// Wrap an already loaded pack.
    pub fn new(pack: PromptPack) -> Self {
        Self {
            pack: Arc::new(pack),
        }
    }

    /// Load the pack for `locale`, honoring a workspace override.
    pub fn load(workspace_path: Option<&Path>, locale: Locale) -> AppResult<Self> {
        Ok(Self::new(load_pack(workspace_path, locale)?))
    }

    /// The underlying pack.
    pub fn pack(&self) -> &PromptPack {
        &self.pack
    }

    pub fn locale(&self) -> Locale {
        self.pack.locale
    }

    /// Question-generation prompt for a strategy.
    pub fn question_prompt(
        &self,
        strategy: &str,
        hypothesis: &str,
        history: &str,
    ) -> AppResult<BuiltPrompt> {
        let template = self.strategy_template(&self.pack.templates.questions, "questions", strategy)?;

        let mut variables = HashMap::new();
        variables.insert("hypothesis".to_string(), hypothesis.to_string());
        variables.insert("history".to_string(), history.to_string());
        variables.insert("strategy".to_string(), strategy.to_string());

        let user = render_template(template, &variables)?;
        Ok(BuiltPrompt::new(
            Some(self.pack.templates.questioner_system.trim().to_string()),
            user.trim().to_string(),
            format!("question.{}", strategy),
            self.pack.locale,
            variables,
        ))
    }

    /// Offline question for a strategy, used when no text generator is configured.
    pub fn fallback_question(&self, strategy: &str, hypothesis: &str) -> AppResult<String> {
        let template = self.strategy_template(
            &self.pack.templates.fallback_questions,
            "fallbackQuestions",
            strategy,
        )?;

        let mut variables = HashMap::new();
        variables.insert("hypothesis".to_string(), hypothesis.trim().to_string());
        Ok(render_template(template, &variables)?.trim().to_string())
    }

    /// Structured analysis request for one question/answer pair.
    pub fn analysis_prompt(&self, question: &str, answer: &str) -> AppResult<BuiltPrompt> {
        let mut variables = HashMap::new();
        variables.insert("question".to_string(), question.to_string());
        variables.insert("answer".to_string(), answer.to_string());
        variables.insert(
            "findings_label".to_string(),
            self.pack.labels.findings_label().to_string(),
        );
        variables.insert(
            "follow_ups_label".to_string(),
            self.pack.labels.follow_ups_label().to_string(),
        );
        variables.insert(
            "absence_finding".to_string(),
            self.pack.absence_finding.clone(),
        );

        let user = render_template(&self.pack.templates.analysis, &variables)?;
        Ok(BuiltPrompt::new(
            None,
            user.trim().to_string(),
            "analysis",
            self.pack.locale,
            variables,
        ))
    }

    /// Role framing sent with every answer-source request.
    pub fn role_framing(&self) -> AppResult<String> {
        Ok(render_template(&self.pack.templates.role_framing, &HashMap::new())?
            .trim()
            .to_string())
    }

    /// Retrieval answer synthesis prompt.
    pub fn rag_prompt(&self, context: &str, question: &str) -> AppResult<BuiltPrompt> {
        let mut variables = HashMap::new();
        variables.insert("context".to_string(), context.to_string());
        variables.insert("question".to_string(), question.to_string());

        let user = render_template(&self.pack.templates.rag_answer, &variables)?;
        Ok(BuiltPrompt::new(
            Some(self.role_framing()?),
            user.trim().to_string(),
            "ragAnswer",
            self.pack.locale,
            variables,
        ))
    }

    fn strategy_template<'a>(
        &self,
        table: &'a HashMap<String, String>,
        table_name: &str,
        strategy: &str,
    ) -> AppResult<&'a str> {
        table.get(strategy).map(String::as_str).ok_or_else(|| {
            AppError::Prompt(format!(
                "No '{}' template for strategy '{}' in locale {}",
                table_name, strategy, self.pack.locale
            ))
        })
    }
}

/// Render a Handlebars template with variables.
pub fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
