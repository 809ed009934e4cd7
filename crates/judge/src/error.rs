use thiserror::Error;

pub type Result<T> = std::result::Result<T, JudgeError>;

#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Chat API returned {status}: {body}")]
    ApiError { status: u16, body: String },

    #[error("Chat API returned no completion text")]
    EmptyCompletion,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Other(String),
}

impl JudgeError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
