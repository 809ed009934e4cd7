use thiserror::Error;

/// Errors raised while decoding a link payload
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not valid base64 even after padding repair
    #[error("Invalid base64 payload: {0}")]
    Base64(String),

    /// Decoded bytes are not UTF-8 text
    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown conflict theme: {0:?} (expected Couple, Friends or Pro)")]
pub struct UnknownTheme(pub String);
