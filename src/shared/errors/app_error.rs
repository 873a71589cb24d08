use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Matcher timed out: {0}")]
    MatcherTimeout(String),

    #[error("Matcher failed: {0}")]
    MatcherException(String),

    #[error("Cache I/O error: {0}")]
    CacheIoError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::CacheIoError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl AppError {
    /// Whether the error should be treated as a degraded-but-recoverable
    /// condition rather than a caller bug.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::MatcherTimeout(_) | AppError::MatcherException(_) | AppError::CacheIoError(_)
        )
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
