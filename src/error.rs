use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HonyakuError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No internet connection available")]
    NetworkUnavailable,

    #[error("Network error: {0}")]
    Network(String),

    #[error("{0} timed out")]
    Timeout(String),

    #[error("Translation model not available: {0}")]
    ModelUnavailable(String),

    #[error("No text found in image")]
    NoTextFound,

    #[error("Unsupported language pair: {0} -> {1}")]
    UnsupportedLanguagePair(String, String),

    #[error("Text recognition error: {0}")]
    Recognition(String),

    #[error("Translation error: {0}")]
    Translation(String),

    #[error("Summarization error: {0}")]
    Summarization(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Operation failed: {0}")]
    Operation(String),
}

/// Machine-readable error classification surfaced to callers alongside the
/// user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NetworkUnavailable,
    NetworkError,
    Timeout,
    ModelUnavailable,
    NoTextFound,
    UnsupportedLanguagePair,
    RecognitionFailed,
    TranslationFailed,
    SummarizationFailed,
    SpeechFailed,
    StorageFailed,
    ConfigurationError,
    OperationFailed,
}

impl HonyakuError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::NetworkUnavailable => ErrorKind::NetworkUnavailable,
            Self::Network(_) | Self::Http(_) => ErrorKind::NetworkError,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::ModelUnavailable(_) => ErrorKind::ModelUnavailable,
            Self::NoTextFound => ErrorKind::NoTextFound,
            Self::UnsupportedLanguagePair(_, _) => ErrorKind::UnsupportedLanguagePair,
            Self::Recognition(_) => ErrorKind::RecognitionFailed,
            Self::Translation(_) => ErrorKind::TranslationFailed,
            Self::Summarization(_) => ErrorKind::SummarizationFailed,
            Self::Speech(_) => ErrorKind::SpeechFailed,
            Self::Database(_) => ErrorKind::StorageFailed,
            Self::Config(_) | Self::Toml(_) => ErrorKind::ConfigurationError,
            Self::Io(_) | Self::Json(_) | Self::Operation(_) => ErrorKind::OperationFailed,
        }
    }

    /// Short message suitable for direct display, without internal detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidInput(reason) => format!("Invalid input: {reason}"),
            Self::NetworkUnavailable => {
                "No internet connection. Please check your network and try again.".to_string()
            }
            Self::Network(_) | Self::Http(_) => {
                "A network error occurred. Please try again.".to_string()
            }
            Self::Timeout(what) => format!("{what} timed out. Please try again."),
            Self::ModelUnavailable(_) => {
                "Translation model not available. Please check your connection.".to_string()
            }
            Self::NoTextFound => {
                "No text detected. Try a different area or an image with clearer text.".to_string()
            }
            Self::UnsupportedLanguagePair(source, target) => {
                format!("Translation from {source} to {target} is not supported.")
            }
            Self::Recognition(_) => "Text recognition failed. Please try again.".to_string(),
            Self::Translation(_) => "Translation failed. Please try again.".to_string(),
            Self::Summarization(_) => "Failed to summarize text.".to_string(),
            Self::Speech(_) => "Speech service error. Please try again.".to_string(),
            Self::Database(_) => "Local storage error.".to_string(),
            Self::Config(_) | Self::Toml(_) => "Configuration error.".to_string(),
            Self::Io(_) | Self::Json(_) | Self::Operation(_) => {
                "An unexpected error occurred. Please try again.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, HonyakuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            HonyakuError::InvalidInput("too short".into()).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(HonyakuError::NoTextFound.kind(), ErrorKind::NoTextFound);
        assert_eq!(
            HonyakuError::Timeout("Translation".into()).kind(),
            ErrorKind::Timeout
        );
    }

    #[test]
    fn test_user_message_is_displayable() {
        let msg = HonyakuError::NetworkUnavailable.user_message();
        assert!(msg.contains("internet"));
        assert!(!msg.contains("reqwest"));
    }
}
