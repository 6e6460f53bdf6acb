//! Error types for NoteChat.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("Extraction error ({file_type}): {message}")]
    Extraction { file_type: String, message: String },

    #[error("No content to index")]
    NoContent,

    #[error("Embedding service error: {0}")]
    EmbeddingService(String),

    #[error("Completion service error: {0}")]
    CompletionService(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn extraction(file_type: impl Into<String>, source: impl std::fmt::Display) -> Self {
        Self::Extraction {
            file_type: file_type.into(),
            message: source.to_string(),
        }
    }

    /// Remote failures that the user can simply retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::EmbeddingService(_) | Self::CompletionService(_) | Self::Timeout(_)
        )
    }

    /// Message shown to end users. Transport details stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(_) => {
                "The service is not configured: an API key is missing.".to_string()
            }
            Self::UnsupportedType(ext) => format!("Unsupported file type: {}", ext),
            Self::Extraction { file_type, .. } => format!(
                "Error processing document: the file could not be read as {}.",
                file_type
            ),
            Self::NoContent => {
                "Error processing document: no text could be found in it.".to_string()
            }
            Self::EmbeddingService(_) | Self::CompletionService(_) => {
                "Sorry, I encountered an error. Please try again.".to_string()
            }
            Self::Timeout(_) => {
                "The request took too long to complete. Please try again.".to_string()
            }
            Self::NotFound(what) => format!("Not found: {}", what),
            Self::InvalidInput(msg) => msg.clone(),
            Self::DimensionMismatch { .. }
            | Self::Io(_)
            | Self::Json(_)
            | Self::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
