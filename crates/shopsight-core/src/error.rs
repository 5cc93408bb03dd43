//! Error types for shopsight

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Bad AI response: {message}")]
    BadAiResponse {
        message: String,
        /// The reply as received, kept for diagnostics
        raw: String,
    },
}

/// Coarse classification of an [`Error`] as seen by API callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No baseline data to work from
    NotFound,
    /// Storage or AI service call failed
    UpstreamFailure,
    /// The AI replied but not with the expected JSON shape
    BadAIResponse,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::BadAiResponse { .. } => ErrorKind::BadAIResponse,
            _ => ErrorKind::UpstreamFailure,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
