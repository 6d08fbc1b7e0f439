//! Error types for Inquest.
//!
//! This module defines a unified error enum covering every failure category
//! the interrogation engine distinguishes: configuration, transport,
//! authorization, ingestion and concurrency violations, plus the ambient
//! I/O, prompt and serialization errors.

use thiserror::Error;

/// Unified error type for Inquest.
///
/// All fallible functions return `Result<T, AppError>`. Cancellation of a run
/// is not an error and has no variant here.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid setup, raised at construction time
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure talking to a generation, conversation, embedding or store service
    #[error("Transport error{}: {message}", status.map(|s| format!(" ({})", s)).unwrap_or_default())]
    Transport {
        /// HTTP-equivalent status, when the service returned one
        status: Option<u16>,
        message: String,
    },

    /// Authorization rejected by a remote service (401/403-equivalent)
    #[error("Authorization error: {0}")]
    Unauthorized(String),

    /// Document load, split, embed or store failure during ingestion
    #[error("Ingestion error: {0}")]
    Ingestion(String),

    /// A run was started while another is active, or stopped while not active
    #[error("Concurrency violation: {0}")]
    Concurrency(String),

    /// Prompt pack and template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Build a transport error without a status code.
    pub fn transport(message: impl Into<String>) -> Self {
        AppError::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// Build a transport error carrying the remote status.
    pub fn transport_status(status: u16, message: impl Into<String>) -> Self {
        AppError::Transport {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Whether this is the authorization subtype of a transport failure.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Unauthorized(_))
    }

    /// Remote status code carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

// io::Error is not Clone; it is rebuilt from its kind and message.
impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::Config(m) => AppError::Config(m.clone()),
            AppError::Io(e) => AppError::Io(std::io::Error::new(e.kind(), e.to_string())),
            AppError::Transport { status, message } => AppError::Transport {
                status: *status,
                message: message.clone(),
            },
            AppError::Unauthorized(m) => AppError::Unauthorized(m.clone()),
            AppError::Ingestion(m) => AppError::Ingestion(m.clone()),
            AppError::Concurrency(m) => AppError::Concurrency(m.clone()),
            AppError::Prompt(m) => AppError::Prompt(m.clone()),
            AppError::Serialization(m) => AppError::Serialization(m.clone()),
            AppError::Other(m) => AppError::Other(m.clone()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
