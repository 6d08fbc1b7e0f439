//! Prompt pack loader.
//!
//! Packs for every built-in locale are embedded in the binary. A workspace may
//! replace one with `.inquest/prompts/<locale>.yaml`; overrides go through the
//! same validation as the built-in packs.

use crate::types::{Locale, PromptPack};
use inquest_core::{AppError, AppResult};
use std::path::{Path, PathBuf};

const EN_PACK: &str = include_str!("../packs/en.yaml");
const PT_PACK: &str = include_str!("../packs/pt.yaml");

/// Strategy names every pack must provide templates for.
pub const REQUIRED_STRATEGIES: [&str; 4] = ["broad-overview", "deep-dive", "fact-check", "timeline"];

/// Load the built-in pack for a locale.
pub fn builtin_pack(locale: Locale) -> AppResult<PromptPack> {
    let source = match locale {
        Locale::En => EN_PACK,
        Locale::Pt => PT_PACK,
    };
    parse_pack(source, &format!("builtin:{}", locale))
}

/// Load every built-in pack.
pub fn builtin_packs() -> AppResult<Vec<PromptPack>> {
    Locale::ALL.iter().map(|l| builtin_pack(*l)).collect()
}

/// Path of the workspace override for a locale.
pub fn override_path(workspace_path: &Path, locale: Locale) -> PathBuf {
    workspace_path
        .join(".inquest/prompts")
        .join(format!("{}.yaml", locale))
}

/// Load the pack for a locale, preferring a workspace override.
///
/// # Example
/// ```no_run
/// use inquest_prompt::{load_pack, Locale};
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pack = load_pack(Some(Path::new(".")), Locale::En)?;
/// println!("Findings label: {}", pack.labels.findings_label());
/// # Ok(())
/// # }
/// ```
pub fn load_pack(workspace_path: Option<&Path>, locale: Locale) -> AppResult<PromptPack> {
    let Some(workspace_path) = workspace_path else {
        return builtin_pack(locale);
    };

    let pack_file = override_path(workspace_path, locale);
    if !pack_file.exists() {
        return builtin_pack(locale);
    }

    tracing::debug!("Loading prompt pack override from: {:?}", pack_file);

    let contents = std::fs::read_to_string(&pack_file).map_err(|e| {
        AppError::Prompt(format!("Failed to read prompt pack {:?}: {}", pack_file, e))
    })?;

    let pack = parse_pack(&contents, &pack_file.display().to_string())?;
    if pack.locale != locale {
        return Err(AppError::Prompt(format!(
            "Prompt pack {:?} declares locale '{}', expected '{}'",
            pack_file, pack.locale, locale
        )));
    }

    tracing::info!("Loaded prompt pack override for locale {}", locale);

    Ok(pack)
}

fn parse_pack(contents: &str, origin: &str) -> AppResult<PromptPack> {
    let pack: PromptPack = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt pack {}: {}", origin, e))
    })?;
    validate_pack(&pack)
        .map_err(|e| AppError::Prompt(format!("Invalid prompt pack {}: {}", origin, e)))?;
    Ok(pack)
}

/// Validate a prompt pack.
fn validate_pack(pack: &PromptPack) -> Result<(), String> {
    if !pack.api_version.contains('.') {
        return Err(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            pack.api_version
        ));
    }

    if pack.labels.findings.iter().all(|l| l.trim().is_empty()) {
        return Err("findings labels cannot be empty".to_string());
    }
    if pack.labels.follow_ups.iter().all(|l| l.trim().is_empty()) {
        return Err("followUps labels cannot be empty".to_string());
    }
    if pack.absence_markers.is_empty() {
        return Err("absenceMarkers cannot be empty".to_string());
    }
    if pack.interrogatives.is_empty() {
        return Err("interrogatives cannot be empty".to_string());
    }
    if pack.interrogatives.iter().any(|w| w.trim().is_empty()) {
        return Err("interrogatives cannot contain blank entries".to_string());
    }
    if pack.absence_finding.trim().is_empty() {
        return Err("absenceFinding cannot be empty".to_string());
    }
    if pack.no_information_answer.trim().is_empty() {
        return Err("noInformationAnswer cannot be empty".to_string());
    }

    let templates = &pack.templates;
    let singles = [
        ("questionerSystem", &templates.questioner_system),
        ("analysis", &templates.analysis),
        ("roleFraming", &templates.role_framing),
        ("ragAnswer", &templates.rag_answer),
    ];
    for (name, template) in singles {
        if template.trim().is_empty() {
            return Err(format!("template '{}' cannot be empty", name));
        }
    }

    for strategy in REQUIRED_STRATEGIES {
        for (table, map) in [
            ("questions", &templates.questions),
            ("fallbackQuestions", &templates.fallback_questions),
        ] {
            if map.get(strategy).map_or(true, |t| t.trim().is_empty()) {
                return Err(format!("template '{}.{}' is missing", table, strategy));
            }
        }
    }

    Ok(())
}
