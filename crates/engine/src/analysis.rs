//! Answer analysis.
//!
//! Structured analysis output has the grammar
//!
//! ```text
//! response := (label-line bullet-line*)*
//! label-line := decorations? LABEL ':'? decorations?
//! bullet-line := ('-' | '*' | '•' | DIGITS ('.' | ')')) ' ' item
//! ```
//!
//! where `LABEL` is any findings or follow-up label of any loaded pack, compared
//! case-insensitively. Lines that are neither labels nor bullets are skipped.
//! Text with no label at all is malformed and goes to the heuristic fallback,
//! which never fails.

use inquest_prompt::PromptPack;
use serde::{Deserialize, Serialize};

/// Findings and follow-up candidates extracted from one answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAnalysis {
    pub findings: Vec<String>,
    pub follow_ups: Vec<String>,
}

#[derive(Clone, Copy)]
enum Section {
    Findings,
    FollowUps,
}

/// Parse a structured analysis response. Returns `None` when no section label
/// is present.
pub fn parse_sections(text: &str, packs: &[PromptPack]) -> Option<AnswerAnalysis> {
    let mut analysis = AnswerAnalysis::default();
    let mut section = None;
    let mut saw_label = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(found) = label_of(trimmed, packs) {
            section = Some(found);
            saw_label = true;
            continue;
        }

        let (Some(current), Some(item)) = (section, bullet_item(trimmed)) else {
            continue;
        };
        match current {
            Section::Findings => analysis.findings.push(item),
            Section::FollowUps => analysis.follow_ups.push(item),
        }
    }

    saw_label.then_some(analysis)
}

fn label_of(line: &str, packs: &[PromptPack]) -> Option<Section> {
    let decorations = |c: char| matches!(c, '#' | '*' | '_' | '`') || c.is_whitespace();
    let candidate = line
        .trim_matches(decorations)
        .trim_end_matches(':')
        .trim_matches(decorations);

    if packs.iter().any(|p| p.is_findings_label(candidate)) {
        Some(Section::Findings)
    } else if packs.iter().any(|p| p.is_follow_ups_label(candidate)) {
        Some(Section::FollowUps)
    } else {
        None
    }
}

fn bullet_item(line: &str) -> Option<String> {
    let rest = if let Some(rest) = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
    {
        rest
    } else {
        let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
        if digits == 0 {
            return None;
        }
        line[digits..]
            .strip_prefix(". ")
            .or_else(|| line[digits..].strip_prefix(") "))?
    };

    let item = rest.trim();
    (!item.is_empty()).then(|| item.to_string())
}

/// Keyword fallback.
///
/// An answer that states the information is absent (in any pack's words)
/// yields only the active pack's absence finding. Otherwise each matching
/// keyword rule of the active pack contributes its finding and follow-up.
pub fn heuristic_analysis(answer: &str, active: &PromptPack, packs: &[PromptPack]) -> AnswerAnalysis {
    if packs.iter().any(|p| p.matches_absence(answer)) || active.matches_absence(answer) {
        return AnswerAnalysis {
            findings: vec![active.absence_finding.clone()],
            follow_ups: Vec::new(),
        };
    }

    let lowered = answer.to_lowercase();
    let mut analysis = AnswerAnalysis::default();
    for rule in active.heuristics.iter().filter(|r| r.matches(&lowered)) {
        if let Some(finding) = &rule.finding {
            analysis.findings.push(finding.clone());
        }
        if let Some(follow_up) = &rule.follow_up {
            analysis.follow_ups.push(follow_up.clone());
        }
    }
    analysis
}
