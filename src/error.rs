//! Error types for novelpress operations.

use thiserror::Error;

/// Errors that can occur while planning chapters or writing a package.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid unit '{id}': {reason}")]
    InvalidUnit { id: String, reason: String },

    #[error("Invalid outline: {0}")]
    InvalidOutline(String),

    #[error("Invalid chapter breaks: {0}")]
    InvalidBreaks(String),

    #[error("Invalid chapter policy: {0}")]
    InvalidPolicy(String),

    #[error("Title generation failed: {0}")]
    TitleGeneration(String),

    #[error("Spine and table of contents disagree: {0}")]
    Inconsistent(String),
}

impl Error {
    pub(crate) fn invalid_unit(id: &str, reason: impl Into<String>) -> Self {
        Error::InvalidUnit {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
