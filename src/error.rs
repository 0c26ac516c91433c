use thiserror::Error;

pub type Result<T> = std::result::Result<T, VoiceQualityError>;

#[derive(Debug, Error)]
pub enum VoiceQualityError {
    /// Empty or malformed input handed to a pure computation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Failed to decode audio: {0}")]
    Decode(#[from] hound::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl VoiceQualityError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        VoiceQualityError::InvalidInput(msg.into())
    }
}
