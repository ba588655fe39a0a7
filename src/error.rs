//! Error handling for the ingestion and question-answering pipeline.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// The machine-tagged error kinds the core promises to its caller.
///
/// These are the *only* tags the core emits; a host mapping this onto HTTP
/// status codes can match on [`CoreError::machine_tag`] exhaustively.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("document is password protected")]
    Encrypted,

    #[error("extraction produced no text")]
    EmptyContent,

    #[error("store failure: {0}")]
    StoreFailure(String),

    #[error("embedding failure: {0}")]
    EmbeddingFailure(String),

    #[error("llm failure: {0}")]
    LlmFailure(String),

    #[error("operation timed out")]
    Timeout,

    #[error("not found: {0}")]
    NotFound(String),
}

impl CoreError {
    /// The machine-readable tag spec.md §6/§7 requires on the HTTP error envelope.
    ///
    /// A host never needs to stringify the `Display` impl for wire purposes;
    /// this is the stable contract instead.
    pub fn machine_tag(&self) -> &'static str {
        match self {
            CoreError::InvalidInput(_) => "InvalidInput",
            CoreError::UnsupportedFormat(_) => "UnsupportedFormat",
            CoreError::Encrypted => "Encrypted",
            CoreError::EmptyContent => "EmptyContent",
            CoreError::StoreFailure(_) => "StoreFailure",
            CoreError::EmbeddingFailure(_) => "EmbeddingFailure",
            CoreError::LlmFailure(_) => "LLMFailure",
            CoreError::Timeout => "Timeout",
            CoreError::NotFound(_) => "NotFound",
        }
    }
}

impl From<std::io::Error> for CoreError {
    fn from(err: std::io::Error) -> Self {
        CoreError::StoreFailure(err.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::InvalidInput(err.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CoreError::Timeout
        } else {
            CoreError::EmbeddingFailure(err.to_string())
        }
    }
}

impl From<tokio_rusqlite::Error> for CoreError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        CoreError::StoreFailure(err.to_string())
    }
}
