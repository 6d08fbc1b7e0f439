//! Source document loading and text extraction.
//!
//! A document is read as one logical text unit. Size and extension checks run
//! before any content is read; decoding falls back from UTF-8 to ISO-8859-1
//! instead of failing.

use inquest_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Default size ceiling for a source document (10 MiB).
pub const DEFAULT_MAX_DOCUMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Extensions accepted by the loader.
pub const SUPPORTED_EXTENSIONS: [&str; 11] = [
    "txt", "text", "log", "csv", "md", "markdown", "html", "htm", "json", "yaml", "yml",
];

/// Content type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Markdown,
    Html,
    Json,
    Yaml,
    PlainText,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" => Some(Self::Html),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            "txt" | "text" | "log" | "csv" => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markdown => "markdown",
            Self::Html => "html",
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::PlainText => "text",
        }
    }
}

/// Metadata describing a loaded document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMetadata {
    pub source_path: PathBuf,
    pub file_name: String,
    pub content_type: ContentType,
    pub size_bytes: u64,
    /// "utf-8" or "iso-8859-1"
    pub encoding: String,
    /// SHA-256 of the raw bytes, hex encoded
    pub content_hash: String,
}

/// One logical text unit extracted from a source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadedDocument {
    pub text: String,
    pub metadata: DocumentMetadata,
}

/// Anything that can turn a path into a [`LoadedDocument`].
#[async_trait::async_trait]
pub trait DocumentSource: Send + Sync {
    async fn load(&self, path: &Path) -> AppResult<LoadedDocument>;
}

/// Filesystem loader with extension dispatch.
#[derive(Debug, Clone)]
pub struct FileLoader {
    max_bytes: u64,
}

impl FileLoader {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DOCUMENT_BYTES)
    }
}

#[async_trait::async_trait]
impl DocumentSource for FileLoader {
    async fn load(&self, path: &Path) -> AppResult<LoadedDocument> {
        let content_type = ContentType::from_path(path).ok_or_else(|| {
            AppError::Ingestion(format!(
                "Unsupported file type {:?}. Supported extensions: {}",
                path,
                SUPPORTED_EXTENSIONS.join(", ")
            ))
        })?;

        let size_bytes = tokio::fs::metadata(path)
            .await
            .map_err(|e| AppError::Ingestion(format!("Failed to stat {:?}: {}", path, e)))?
            .len();

        if size_bytes > self.max_bytes {
            return Err(AppError::Ingestion(format!(
                "Document {:?} is {} bytes, above the {} byte limit",
                path, size_bytes, self.max_bytes
            )));
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Ingestion(format!("Failed to read {:?}: {}", path, e)))?;

        let (raw, encoding) = decode(&bytes);
        let content_hash = format!("{:x}", Sha256::digest(&bytes));

        let text = match content_type {
            ContentType::Markdown => clean_markdown(&raw),
            ContentType::Html => clean_html(&raw),
            ContentType::Json | ContentType::Yaml | ContentType::PlainText => {
                raw.replace("\r\n", "\n")
            }
        };

        tracing::debug!(
            path = ?path,
            content_type = content_type.as_str(),
            encoding,
            size_bytes,
            "Loaded document"
        );

        Ok(LoadedDocument {
            text,
            metadata: DocumentMetadata {
                source_path: path.to_path_buf(),
                file_name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                content_type,
                size_bytes,
                encoding: encoding.to_string(),
                content_hash,
            },
        })
    }
}

/// Decode bytes as UTF-8, falling back to ISO-8859-1.
fn decode(bytes: &[u8]) -> (String, &'static str) {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), "utf-8"),
        // Every byte maps to the code point of the same value
        Err(_) => (bytes.iter().map(|&b| b as char).collect(), "iso-8859-1"),
    }
}

/// Clean markdown by removing heading markers and fence lines.
fn clean_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let trimmed = line.trim();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            continue;
        }

        let content = if trimmed.starts_with('#') {
            trimmed.trim_start_matches('#').trim()
        } else {
            line.trim_end()
        };

        result.push_str(content);
        result.push('\n');
    }

    result.trim().to_string()
}

const INLINE_TAGS: [&str; 10] = ["a", "b", "i", "u", "em", "strong", "span", "small", "code", "mark"];

/// Extract readable text from HTML.
fn clean_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find('<') {
        result.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let skip = if starts_with_ignore_case(tail, "<script") {
            block_end(tail, "</script")
        } else if starts_with_ignore_case(tail, "<style") {
            block_end(tail, "</style")
        } else if tail.starts_with("<!--") {
            tail.find("-->").map(|i| i + 3)
        } else {
            tail.find('>').map(|i| i + 1)
        };

        let Some(skip) = skip else {
            // Unterminated tag or block, drop the remainder
            rest = "";
            break;
        };

        if !INLINE_TAGS.contains(&tag_name(tail).as_str()) {
            result.push(' ');
        }
        rest = &tail[skip..];
    }
    result.push_str(rest);

    decode_entities(&result)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn starts_with_ignore_case(haystack: &str, prefix: &str) -> bool {
    haystack.len() >= prefix.len()
        && haystack.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Byte offset just past the closing tag of a script/style block.
fn block_end(tail: &str, closing: &str) -> Option<usize> {
    // ASCII lowercasing keeps byte offsets intact
    let lower = tail.to_ascii_lowercase();
    let close = lower.find(closing)?;
    let gt = lower[close..].find('>')?;
    Some(close + gt + 1)
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('<')
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Decode named and numeric HTML entities.
fn decode_entities(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((ch, semi)) => {
                result.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}
