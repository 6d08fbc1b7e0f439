//! Prompt pack types.
//!
//! A pack is the complete, data-driven string table for one locale. Every
//! locale-specific decision the engine makes (section labels, absence markers,
//! interrogative openers, heuristic keywords) reads from a pack, so adding a
//! locale means adding a YAML file and never a code branch.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use unicode_segmentation::UnicodeSegmentation;

use inquest_core::AppError;

/// Built-in prompt locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    Pt,
}

impl Locale {
    /// All built-in locales.
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Pt];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Pt => "pt",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "en-us" | "en-gb" => Ok(Locale::En),
            "pt" | "pt-br" | "pt-pt" => Ok(Locale::Pt),
            other => Err(AppError::Config(format!(
                "Unknown locale: {}. Supported: en, pt",
                other
            ))),
        }
    }
}

/// The string table and templates for one locale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPack {
    pub locale: Locale,

    /// API version for schema evolution
    pub api_version: String,

    /// Section labels recognised in structured analysis output
    pub labels: SectionLabels,

    /// Phrases signalling that the requested information is absent
    pub absence_markers: Vec<String>,

    /// Question words that make a sentence read as a question without a
    /// trailing `?`. Auxiliary verbs do not belong here.
    pub interrogatives: Vec<String>,

    /// Keyword rules for the offline analysis fallback
    #[serde(default)]
    pub heuristics: Vec<HeuristicRule>,

    /// Finding recorded by the fallback when the answer states absence
    pub absence_finding: String,

    /// Retrieval answer when no excerpt matches the question
    pub no_information_answer: String,

    pub templates: PackTemplates,
}

/// Findings and follow-up section labels. The first entry of each list is
/// the canonical label rendered into prompts; the rest are accepted aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionLabels {
    pub findings: Vec<String>,
    pub follow_ups: Vec<String>,
}

impl SectionLabels {
    pub fn findings_label(&self) -> &str {
        self.findings.first().map(String::as_str).unwrap_or_default()
    }

    pub fn follow_ups_label(&self) -> &str {
        self.follow_ups.first().map(String::as_str).unwrap_or_default()
    }
}

/// A keyword-triggered heuristic used when structured analysis is unavailable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeuristicRule {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub finding: Option<String>,
    #[serde(default)]
    pub follow_up: Option<String>,
}

impl HeuristicRule {
    /// Whether any keyword occurs as a whole word in the already lowercased text.
    pub fn matches(&self, lowered: &str) -> bool {
        lowered
            .unicode_words()
            .any(|word| self.keywords.iter().any(|k| k.to_lowercase() == word))
    }
}

/// Handlebars templates carried by a pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackTemplates {
    /// System prompt for the questioner
    pub questioner_system: String,

    /// Question-generation template per strategy name
    pub questions: HashMap<String, String>,

    /// Offline question per strategy name
    pub fallback_questions: HashMap<String, String>,

    /// Structured answer analysis request
    pub analysis: String,

    /// Role framing for the answer source
    pub role_framing: String,

    /// Retrieval answer synthesis
    pub rag_answer: String,
}

impl PromptPack {
    /// Whether `text` contains one of this pack's absence markers.
    pub fn matches_absence(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.absence_markers
            .iter()
            .any(|m| lowered.contains(m.to_lowercase().as_str()))
    }

    /// Whether `text` reads as a direct question in this locale.
    pub fn reads_as_question(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.ends_with('?') {
            return true;
        }
        let lowered = trimmed.trim_start_matches('¿').to_lowercase();
        self.interrogatives.iter().any(|opener| {
            let opener = opener.to_lowercase();
            lowered == opener
                || lowered
                    .strip_prefix(opener.as_str())
                    .is_some_and(|rest| rest.starts_with(' ') || rest.starts_with(','))
        })
    }

    /// Whether `label` names this pack's findings section.
    pub fn is_findings_label(&self, label: &str) -> bool {
        contains_label(&self.labels.findings, label)
    }

    /// Whether `label` names this pack's follow-up section.
    pub fn is_follow_ups_label(&self, label: &str) -> bool {
        contains_label(&self.labels.follow_ups, label)
    }
}

fn contains_label(labels: &[String], candidate: &str) -> bool {
    let candidate = candidate.trim().to_lowercase();
    labels.iter().any(|l| l.to_lowercase() == candidate)
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,

    /// Metadata about the built prompt
    pub metadata: BuiltPromptMetadata,
}

/// Metadata about a built prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPromptMetadata {
    /// Template that produced the prompt (e.g. "question.deep-dive")
    #[serde(rename = "templateId")]
    pub template_id: String,

    /// Pack locale
    pub locale: Locale,

    /// Template variables that were resolved
    #[serde(rename = "resolvedVariables")]
    pub resolved_variables: HashMap<String, String>,
}

impl BuiltPrompt {
    /// Create a new built prompt.
    pub fn new(
        system: Option<String>,
        user: String,
        template_id: impl Into<String>,
        locale: Locale,
        resolved_variables: HashMap<String, String>,
    ) -> Self {
        Self {
            system,
            user,
            metadata: BuiltPromptMetadata {
                template_id: template_id.into(),
                locale,
                resolved_variables,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_parsing() {
        assert_eq!("en".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("PT-BR".parse::<Locale>().unwrap(), Locale::Pt);
        assert!(matches!("fr".parse::<Locale>(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_heuristic_rule_matching() {
        let rule = HeuristicRule {
            keywords: vec!["Date".to_string(), "yesterday".to_string()],
            finding: Some("mentions time".to_string()),
            follow_up: None,
        };
        assert!(rule.matches("it happened on that date"));
        assert!(!rule.matches("it happened at home"));
        // Whole words only
        assert!(!rule.matches("they sent an update"));
    }

    #[test]
    fn test_built_prompt_creation() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "test".to_string());

        let built = BuiltPrompt::new(
            Some("System message".to_string()),
            "User message".to_string(),
            "analysis",
            Locale::En,
            vars,
        );

        assert_eq!(built.system, Some("System message".to_string()));
        assert_eq!(built.user, "User message");
        assert_eq!(built.metadata.template_id, "analysis");
        assert_eq!(built.metadata.locale, Locale::En);
    }
}
