//! Prompt packs for Inquest.
//!
//! This crate provides locale-aware prompt management with:
//! - YAML locale packs (English and Portuguese) embedded in the binary
//! - Workspace overrides under `.inquest/prompts/`
//! - Handlebars template rendering

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{render_template, PromptCatalog};
pub use loader::{builtin_pack, builtin_packs, load_pack};
pub use types::{
    BuiltPrompt, BuiltPromptMetadata, HeuristicRule, Locale, PackTemplates, PromptPack,
    SectionLabels,
};
